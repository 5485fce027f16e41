//! Gated condition watchers.
//!
//! A [`Sensor`] couples a [`Detector`] (the condition being watched) with a
//! [`SensorGate`] (active flag plus warm-up delay) and an [`EventSource`]
//! whose subscribers are behavior states. Sensors live in the
//! [`BehaviorMachine`](super::behaviormachine::BehaviorMachine) arena and are
//! addressed by [`SensorId`].
//!
//! Evaluation rules:
//! - inactive sensors never evaluate and never notify
//! - while the warm-up runs, only the warm-up advances
//! - the frame in which the warm-up completes also evaluates
//!
//! The damage variant of a sensor is its own component, see
//! [`DamageSensor`](super::damagesensor::DamageSensor); it shares the gate.

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::behaviorstate::StateId;
use super::eventsource::EventSource;
use super::perception::{Axis, ContactPhase, LayerMask, Perception};
use super::timer::Timer;
use crate::error::BehaviorError;

/// Handle of a sensor inside a behavior machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(pub usize);

/// Tag describing what a sensor watches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Distance,
    Area,
    Collision,
    Damage,
    Timer,
    Custom,
}

/// Active flag and warm-up delay shared by every sensor variant.
#[derive(Clone, Debug)]
pub struct SensorGate {
    active: bool,
    warmup: Timer,
    warmup_elapsed: bool,
}

impl SensorGate {
    pub fn new(warmup: f32) -> Self {
        SensorGate {
            active: false,
            warmup: Timer::new(warmup),
            warmup_elapsed: false,
        }
    }

    /// Activate and restart the warm-up. A zero warm-up is elapsed at once.
    pub fn start(&mut self) {
        self.active = true;
        if self.warmup.duration() > 0.0 {
            self.warmup.start();
            self.warmup_elapsed = false;
        } else {
            self.warmup_elapsed = true;
        }
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Advance the warm-up by `dt` and report whether detection may run this
    /// frame.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        if !self.warmup_elapsed {
            self.warmup.tick(dt);
            if self.warmup.remaining() <= 0.0 {
                self.warmup_elapsed = true;
            } else {
                return false;
            }
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_ready(&self) -> bool {
        self.active && self.warmup_elapsed
    }

    pub fn warmup(&self) -> f32 {
        self.warmup.duration()
    }
}

impl Default for SensorGate {
    fn default() -> Self {
        SensorGate::new(0.0)
    }
}

/// Whether a detector fires when the condition holds or when it does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Inside,
    Outside,
}

/// Half of an axis a single-axis distance check looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    #[default]
    Both,
    /// `-x` on the X axis, `+y` on the Y axis.
    UpOrLeft,
    /// `+x` on the X axis, `-y` on the Y axis.
    DownOrRight,
}

/// How a distance detector measures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistanceMode {
    Magnitude,
    SingleAxis {
        axis: Axis,
        #[serde(default)]
        side: AxisSide,
    },
}

#[derive(Clone, Debug)]
pub struct DistanceDetector {
    pub target: Option<Entity>,
    pub mode: DistanceMode,
    pub distance: f32,
    pub condition: Condition,
}

impl DistanceDetector {
    pub fn new(target: Option<Entity>, mode: DistanceMode, distance: f32) -> Self {
        DistanceDetector {
            target,
            mode,
            distance: distance.max(0.0),
            condition: Condition::Inside,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Distances are measured between centers.
    pub fn test(&self, own: Vec2, target: Vec2) -> bool {
        let within = match self.mode {
            DistanceMode::Magnitude => own.distance(target) <= self.distance,
            DistanceMode::SingleAxis { axis, side } => {
                let gap = (axis.of(own) - axis.of(target)).abs();
                let correct_side = match (side, axis) {
                    (AxisSide::Both, _) => true,
                    (AxisSide::UpOrLeft, Axis::X) => target.x < own.x,
                    (AxisSide::DownOrRight, Axis::X) => target.x > own.x,
                    (AxisSide::UpOrLeft, Axis::Y) => target.y > own.y,
                    (AxisSide::DownOrRight, Axis::Y) => target.y < own.y,
                };
                gap <= self.distance && correct_side
            }
        };
        match self.condition {
            Condition::Inside => within,
            Condition::Outside => !within,
        }
    }
}

/// Trigger-overlap detector: fires when the target enters (inside) or
/// leaves (outside) the agent's trigger area.
#[derive(Clone, Debug)]
pub struct AreaDetector {
    pub target: Option<Entity>,
    pub condition: Condition,
}

#[derive(Clone, Debug)]
pub struct CollisionDetector {
    pub layers: LayerMask,
    /// Only count contacts whose normal is dominated by this axis.
    pub axis: Option<Axis>,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        CollisionDetector {
            layers: LayerMask::ALL,
            axis: None,
        }
    }
}

/// Fires once per activation, `interval` seconds after warm-up.
#[derive(Clone, Debug)]
pub struct TimerDetector {
    interval: Timer,
    fired: bool,
}

impl TimerDetector {
    pub fn new(interval: f32) -> Self {
        TimerDetector {
            interval: Timer::new(interval),
            fired: false,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval.duration()
    }

    pub fn remaining(&self) -> f32 {
        self.interval.remaining()
    }
}

/// Condition watched by a [`Sensor`].
#[derive(Clone, Debug)]
pub enum Detector {
    Distance(DistanceDetector),
    Area(AreaDetector),
    Collision(CollisionDetector),
    Timer(TimerDetector),
    Custom(fn(&Perception) -> bool),
}

impl Detector {
    pub fn kind(&self) -> SensorKind {
        match self {
            Detector::Distance(_) => SensorKind::Distance,
            Detector::Area(_) => SensorKind::Area,
            Detector::Collision(_) => SensorKind::Collision,
            Detector::Timer(_) => SensorKind::Timer,
            Detector::Custom(_) => SensorKind::Custom,
        }
    }

    fn target(&self) -> Option<Entity> {
        match self {
            Detector::Distance(d) => d.target,
            Detector::Area(a) => a.target,
            _ => None,
        }
    }

    fn restart(&mut self) {
        if let Detector::Timer(t) = self {
            t.interval.start();
            t.fired = false;
        }
    }
}

/// A detector behind a gate, notifying subscribed states when it fires.
#[derive(Clone, Debug)]
pub struct Sensor {
    name: String,
    detector: Detector,
    gate: SensorGate,
    source: EventSource<StateId>,
    debug: bool,
    missing_target_logged: bool,
}

impl Sensor {
    pub fn new(name: impl Into<String>, detector: Detector) -> Self {
        Sensor {
            name: name.into(),
            detector,
            gate: SensorGate::default(),
            source: EventSource::new(),
            debug: false,
            missing_target_logged: false,
        }
    }

    /// Set the warm-up delay applied on every `start`.
    pub fn with_warmup(mut self, seconds: f32) -> Self {
        self.gate = SensorGate::new(seconds);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SensorKind {
        self.detector.kind()
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn gate(&self) -> &SensorGate {
        &self.gate
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Point a distance or area detector at `target`.
    ///
    /// Returns false when the detector has no target to set.
    pub fn set_target(&mut self, target: Entity) -> bool {
        match &mut self.detector {
            Detector::Distance(d) => d.target = Some(target),
            Detector::Area(a) => a.target = Some(target),
            _ => return false,
        }
        self.missing_target_logged = false;
        true
    }

    pub fn start(&mut self) {
        self.gate.start();
        self.detector.restart();
        self.missing_target_logged = false;
        if self.detector.target().is_none()
            && matches!(self.detector, Detector::Distance(_) | Detector::Area(_))
        {
            warn!("Sensor '{}' started without a target", self.name);
            self.missing_target_logged = true;
        }
        if self.debug {
            debug!("Sensor '{}' started", self.name);
        }
    }

    pub fn stop(&mut self) {
        self.gate.stop();
        if self.debug {
            debug!("Sensor '{}' stopped", self.name);
        }
    }

    /// Advance the gate and evaluate the detector against this frame's
    /// perception. Returns true when the sensor fires.
    pub fn update(&mut self, dt: f32, perception: &Perception) -> bool {
        if !self.gate.advance(dt) {
            return false;
        }
        let fired = match &mut self.detector {
            Detector::Distance(d) => {
                match d.target.and_then(|t| perception.target(t)) {
                    Some(info) => d.test(perception.position, info.position),
                    None => {
                        if !self.missing_target_logged {
                            warn!("Sensor '{}': target not perceived", self.name);
                            self.missing_target_logged = true;
                        }
                        false
                    }
                }
            }
            Detector::Area(a) => match a.target {
                Some(target) => perception.contacts_with(target).any(|c| match c.phase {
                    ContactPhase::Begin | ContactPhase::Stay => a.condition == Condition::Inside,
                    ContactPhase::End => a.condition == Condition::Outside,
                }),
                None => false,
            },
            Detector::Collision(c) => perception.contacts.iter().any(|contact| {
                contact.phase != ContactPhase::End
                    && c.layers.contains(contact.layer)
                    && c.axis.is_none_or(|axis| axis.dominates(contact.normal))
            }),
            Detector::Timer(t) => {
                if t.fired {
                    false
                } else {
                    t.interval.tick(dt);
                    if t.interval.remaining() <= 0.0 {
                        t.fired = true;
                        true
                    } else {
                        false
                    }
                }
            }
            Detector::Custom(predicate) => predicate(perception),
        };
        if fired && self.debug {
            debug!("Sensor '{}' fired", self.name);
        }
        fired
    }

    pub fn subscribe(&mut self, state: StateId) {
        self.source.subscribe(state);
    }

    pub fn unsubscribe(&mut self, state: StateId) -> Result<(), BehaviorError> {
        self.source.unsubscribe(&state)
    }

    pub fn subscriber_count(&self) -> usize {
        self.source.subscriber_count()
    }

    pub fn source(&self) -> &EventSource<StateId> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::perception::Contact;
    use bevy_ecs::world::World;

    fn target_entity() -> Entity {
        let mut world = World::new();
        world.spawn_empty().id()
    }

    fn perceiving(target: Entity, at: Vec2) -> Perception {
        let mut p = Perception::new(Vec2::ZERO);
        p.set_target(target, at, Vec2::splat(0.5));
        p
    }

    #[test]
    fn test_gate_zero_warmup_ready_on_start() {
        let mut gate = SensorGate::new(0.0);
        assert!(!gate.advance(0.1));
        gate.start();
        assert!(gate.is_ready());
        assert!(gate.advance(0.0));
    }

    #[test]
    fn test_gate_completes_in_evaluating_frame() {
        let mut gate = SensorGate::new(1.0);
        gate.start();
        assert!(!gate.advance(0.5));
        assert!(gate.advance(0.5));
        gate.stop();
        assert!(!gate.advance(0.5));
    }

    #[test]
    fn test_inactive_sensor_never_fires() {
        let target = target_entity();
        let detector = DistanceDetector::new(Some(target), DistanceMode::Magnitude, 10.0);
        let mut sensor = Sensor::new("near", Detector::Distance(detector));
        let p = perceiving(target, Vec2::new(1.0, 0.0));
        assert!(!sensor.update(0.1, &p));
        sensor.start();
        assert!(sensor.update(0.1, &p));
        sensor.stop();
        assert!(!sensor.update(0.1, &p));
    }

    #[test]
    fn test_warmup_suppresses_detection() {
        let target = target_entity();
        let detector = DistanceDetector::new(Some(target), DistanceMode::Magnitude, 10.0);
        let mut sensor = Sensor::new("near", Detector::Distance(detector)).with_warmup(1.0);
        let p = perceiving(target, Vec2::ZERO);
        sensor.start();
        assert!(!sensor.update(0.25, &p));
        assert!(!sensor.update(0.25, &p));
        assert!(!sensor.update(0.25, &p));
        assert!(sensor.update(0.25, &p));
        // restart re-arms the warm-up
        sensor.stop();
        sensor.start();
        assert!(!sensor.update(0.5, &p));
    }

    #[test]
    fn test_distance_magnitude_outside() {
        let target = target_entity();
        let detector = DistanceDetector::new(Some(target), DistanceMode::Magnitude, 2.0)
            .with_condition(Condition::Outside);
        assert!(!detector.test(Vec2::ZERO, Vec2::new(2.0, 0.0)));
        assert!(detector.test(Vec2::ZERO, Vec2::new(2.5, 0.0)));
    }

    #[test]
    fn test_distance_single_axis_sides() {
        let left = DistanceDetector::new(
            None,
            DistanceMode::SingleAxis {
                axis: Axis::X,
                side: AxisSide::UpOrLeft,
            },
            3.0,
        );
        assert!(left.test(Vec2::ZERO, Vec2::new(-2.0, 50.0)));
        assert!(!left.test(Vec2::ZERO, Vec2::new(2.0, 0.0)));
        assert!(!left.test(Vec2::ZERO, Vec2::new(-4.0, 0.0)));

        let up = DistanceDetector::new(
            None,
            DistanceMode::SingleAxis {
                axis: Axis::Y,
                side: AxisSide::UpOrLeft,
            },
            3.0,
        );
        assert!(up.test(Vec2::ZERO, Vec2::new(0.0, 1.0)));
        assert!(!up.test(Vec2::ZERO, Vec2::new(0.0, -1.0)));

        let both = DistanceDetector::new(
            None,
            DistanceMode::SingleAxis {
                axis: Axis::Y,
                side: AxisSide::Both,
            },
            3.0,
        );
        assert!(both.test(Vec2::ZERO, Vec2::new(100.0, -3.0)));
    }

    #[test]
    fn test_missing_target_does_not_fire() {
        let target = target_entity();
        let detector = DistanceDetector::new(Some(target), DistanceMode::Magnitude, 10.0);
        let mut sensor = Sensor::new("near", Detector::Distance(detector));
        sensor.start();
        let empty = Perception::default();
        assert!(!sensor.update(0.1, &empty));
        assert!(!sensor.update(0.1, &empty));
    }

    #[test]
    fn test_area_inside_and_outside() {
        let target = target_entity();
        let mut p = Perception::default();
        p.push_contact(Contact {
            other: target,
            phase: ContactPhase::Begin,
            layer: 0,
            normal: Vec2::X,
        });
        let mut inside = Sensor::new(
            "enter",
            Detector::Area(AreaDetector {
                target: Some(target),
                condition: Condition::Inside,
            }),
        );
        let mut outside = Sensor::new(
            "leave",
            Detector::Area(AreaDetector {
                target: Some(target),
                condition: Condition::Outside,
            }),
        );
        inside.start();
        outside.start();
        assert!(inside.update(0.1, &p));
        assert!(!outside.update(0.1, &p));

        p.clear_contacts();
        p.push_contact(Contact {
            other: target,
            phase: ContactPhase::End,
            layer: 0,
            normal: Vec2::X,
        });
        assert!(!inside.update(0.1, &p));
        assert!(outside.update(0.1, &p));
    }

    #[test]
    fn test_collision_layer_and_axis_filter() {
        let other = target_entity();
        let mut p = Perception::default();
        p.push_contact(Contact {
            other,
            phase: ContactPhase::Stay,
            layer: 3,
            normal: Vec2::new(0.0, 1.0),
        });
        let mut wrong_layer = Sensor::new(
            "wall",
            Detector::Collision(CollisionDetector {
                layers: LayerMask::single(2),
                axis: None,
            }),
        );
        let mut wrong_axis = Sensor::new(
            "side",
            Detector::Collision(CollisionDetector {
                layers: LayerMask::single(3),
                axis: Some(Axis::X),
            }),
        );
        let mut floor = Sensor::new(
            "floor",
            Detector::Collision(CollisionDetector {
                layers: LayerMask::single(3),
                axis: Some(Axis::Y),
            }),
        );
        for s in [&mut wrong_layer, &mut wrong_axis, &mut floor] {
            s.start();
        }
        assert!(!wrong_layer.update(0.1, &p));
        assert!(!wrong_axis.update(0.1, &p));
        assert!(floor.update(0.1, &p));
    }

    #[test]
    fn test_timer_fires_once_per_activation() {
        let mut sensor = Sensor::new("patience", Detector::Timer(TimerDetector::new(1.0)));
        let p = Perception::default();
        sensor.start();
        assert!(!sensor.update(0.5, &p));
        assert!(sensor.update(0.5, &p));
        assert!(!sensor.update(0.5, &p));
        sensor.stop();
        sensor.start();
        assert!(!sensor.update(0.5, &p));
        assert!(sensor.update(0.5, &p));
    }

    #[test]
    fn test_custom_predicate() {
        fn right_of_origin(p: &Perception) -> bool {
            p.position.x > 0.0
        }
        let mut sensor = Sensor::new("custom", Detector::Custom(right_of_origin));
        assert_eq!(sensor.kind(), SensorKind::Custom);
        sensor.start();
        assert!(!sensor.update(0.1, &Perception::new(Vec2::new(-1.0, 0.0))));
        assert!(sensor.update(0.1, &Perception::new(Vec2::new(1.0, 0.0))));
    }

    #[test]
    fn test_set_target_only_for_targeted_detectors() {
        let target = target_entity();
        let mut timer = Sensor::new("t", Detector::Timer(TimerDetector::new(1.0)));
        assert!(!timer.set_target(target));
        let mut distance = Sensor::new(
            "d",
            Detector::Distance(DistanceDetector::new(None, DistanceMode::Magnitude, 1.0)),
        );
        assert!(distance.set_target(target));
        distance.start();
        assert!(distance.update(0.1, &perceiving(target, Vec2::new(0.5, 0.0))));
    }

    #[test]
    fn test_subscription_bookkeeping() {
        let mut sensor = Sensor::new("t", Detector::Timer(TimerDetector::new(1.0)));
        assert!(matches!(
            sensor.unsubscribe(StateId(0)),
            Err(BehaviorError::SubscriptionUnderflow)
        ));
        sensor.subscribe(StateId(0));
        sensor.subscribe(StateId(1));
        assert_eq!(sensor.subscriber_count(), 2);
        sensor.unsubscribe(StateId(0)).unwrap();
        assert_eq!(sensor.subscriber_count(), 1);
    }
}
