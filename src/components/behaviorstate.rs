//! A node of an agent's behavior graph.
//!
//! A [`BehaviorState`] aggregates:
//! - actuators, at most one per [`ActuatorKind`]
//! - explicitly required sensors
//! - transition edges, each mapping a sensor to a target state
//! - damage emitters enabled while the state is active
//!
//! The sensors a state runs are the ordered union of its actuators' sensors,
//! its explicit sensors and its edge sensors.
//!
//! # Transition protocol
//!
//! While active, the first edge whose sensor fires latches its target into
//! `pending_transition`; later firings are ignored until the next
//! activation. The owner polls the latch and performs the swap. The latch is
//! cleared on both activation and deactivation.
//!
//! Activation order: clear latch, enter actuators, start sensors, enable
//! emitters, subscribe to edge sensors. Deactivation reverses it:
//! unsubscribe, stop sensors, exit actuators, disable emitters, clear latch.

use bevy_ecs::prelude::Entity;
use log::{debug, warn};

use super::actuator::{Actuator, ActuatorContext, ActuatorKind};
use super::agentcommand::AgentCommand;
use super::sensor::{Sensor, SensorId};
use crate::error::BehaviorError;

/// Handle of a state inside a behavior machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub usize);

/// When `sensor` fires, go to `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionEdge {
    pub sensor: SensorId,
    pub target: StateId,
}

#[derive(Debug)]
pub struct BehaviorState {
    name: String,
    actuators: Vec<Box<dyn Actuator>>,
    sensors: Vec<SensorId>,
    transitions: Vec<TransitionEdge>,
    emitters: Vec<Entity>,
    damage_sensing: bool,
    pending: Option<StateId>,
    active: bool,
    debug: bool,
}

impl BehaviorState {
    pub fn new(name: impl Into<String>) -> Self {
        BehaviorState {
            name: name.into(),
            actuators: Vec::new(),
            sensors: Vec::new(),
            transitions: Vec::new(),
            emitters: Vec::new(),
            damage_sensing: false,
            pending: None,
            active: false,
            debug: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pending_transition(&self) -> Option<StateId> {
        self.pending
    }

    pub fn transitions(&self) -> &[TransitionEdge] {
        &self.transitions
    }

    pub fn emitters(&self) -> &[Entity] {
        &self.emitters
    }

    pub fn actuator_kinds(&self) -> Vec<ActuatorKind> {
        self.actuators.iter().map(|a| a.kind()).collect()
    }

    pub fn actuators_mut(&mut self) -> &mut [Box<dyn Actuator>] {
        &mut self.actuators
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        for actuator in &mut self.actuators {
            actuator.set_debug(debug);
        }
    }

    /// Add an actuator. A second actuator of an existing kind is discarded
    /// with a warning; returns whether it was kept.
    pub fn add_actuator(&mut self, actuator: Box<dyn Actuator>) -> bool {
        let kind = actuator.kind();
        if self.actuators.iter().any(|a| a.kind() == kind) {
            warn!(
                "State '{}' already has a {:?} actuator, discarding the new one",
                self.name, kind
            );
            return false;
        }
        let mut actuator = actuator;
        actuator.set_debug(self.debug);
        self.actuators.push(actuator);
        true
    }

    /// Replace the actuator list, keeping the first actuator of each kind.
    pub fn set_actuators(&mut self, actuators: Vec<Box<dyn Actuator>>) {
        self.actuators = actuators;
        self.validate_actuators();
    }

    /// Drop every actuator whose kind already appeared earlier in the list.
    /// Returns how many were removed.
    pub fn validate_actuators(&mut self) -> usize {
        let mut seen: Vec<ActuatorKind> = Vec::with_capacity(self.actuators.len());
        let before = self.actuators.len();
        let name = &self.name;
        self.actuators.retain(|a| {
            let kind = a.kind();
            if seen.contains(&kind) {
                warn!("State '{}' has a duplicated {:?} actuator, removing it", name, kind);
                false
            } else {
                seen.push(kind);
                true
            }
        });
        before - self.actuators.len()
    }

    pub fn remove_actuator(&mut self, kind: ActuatorKind) -> bool {
        let before = self.actuators.len();
        self.actuators.retain(|a| a.kind() != kind);
        before != self.actuators.len()
    }

    /// Require `sensor` to run while this state is active.
    pub fn add_sensor(&mut self, sensor: SensorId) {
        if !self.sensors.contains(&sensor) {
            self.sensors.push(sensor);
        }
    }

    pub fn add_transition(&mut self, sensor: SensorId, target: StateId) {
        self.transitions.push(TransitionEdge { sensor, target });
    }

    /// Enable `emitter` while this state is active.
    pub fn add_emitter(&mut self, emitter: Entity) {
        if !self.emitters.contains(&emitter) {
            self.emitters.push(emitter);
        }
    }

    /// Keep the agent's damage sensor running while this state is active.
    pub fn set_damage_sensing(&mut self, enabled: bool) {
        self.damage_sensing = enabled;
    }

    pub fn damage_sensing(&self) -> bool {
        self.damage_sensing
    }

    /// Ordered, duplicate-free union of actuator, explicit and edge sensors.
    pub fn sensor_union(&self) -> Vec<SensorId> {
        let mut union: Vec<SensorId> = Vec::new();
        let all = self
            .actuators
            .iter()
            .flat_map(|a| a.sensors().iter().copied())
            .chain(self.sensors.iter().copied())
            .chain(self.transitions.iter().map(|t| t.sensor));
        for id in all {
            if !union.contains(&id) {
                union.push(id);
            }
        }
        union
    }

    /// Distinct sensors that have at least one edge, in edge order.
    fn edge_sensors(&self) -> Vec<SensorId> {
        let mut out: Vec<SensorId> = Vec::new();
        for edge in &self.transitions {
            if !out.contains(&edge.sensor) {
                out.push(edge.sensor);
            }
        }
        out
    }

    fn toggle_outputs(&self, on: bool, ctx: &mut ActuatorContext) {
        for &emitter in &self.emitters {
            ctx.push(AgentCommand::SetEmitting {
                emitter,
                emitting: on,
            });
        }
        if self.damage_sensing {
            let entity = ctx.entity;
            ctx.push(AgentCommand::SetDamageSensing { entity, active: on });
        }
    }

    /// Make this state current. `id` is this state's own handle, used as the
    /// subscription key on edge sensors.
    /// Activating a state that is already active does nothing.
    pub fn activate(&mut self, id: StateId, sensors: &mut [Sensor], ctx: &mut ActuatorContext) {
        if self.active {
            warn!("State '{}' is already active on {:?}", self.name, ctx.entity);
            return;
        }
        self.pending = None;
        for actuator in &mut self.actuators {
            actuator.enter(ctx);
        }
        for sensor_id in self.sensor_union() {
            match sensors.get_mut(sensor_id.0) {
                Some(sensor) => sensor.start(),
                None => warn!("State '{}' references unknown sensor {:?}", self.name, sensor_id),
            }
        }
        self.toggle_outputs(true, ctx);
        for sensor_id in self.edge_sensors() {
            if let Some(sensor) = sensors.get_mut(sensor_id.0) {
                sensor.subscribe(id);
            }
        }
        self.active = true;
        if self.debug {
            debug!("State '{}' activated on {:?}", self.name, ctx.entity);
        }
    }

    /// Leave this state. Teardown always runs to completion; the first
    /// unsubscription error, if any, is returned afterwards.
    pub fn deactivate(
        &mut self,
        id: StateId,
        sensors: &mut [Sensor],
        ctx: &mut ActuatorContext,
    ) -> Result<(), BehaviorError> {
        let mut first_error = None;
        for sensor_id in self.edge_sensors() {
            if let Some(sensor) = sensors.get_mut(sensor_id.0) {
                if let Err(e) = sensor.unsubscribe(id) {
                    warn!(
                        "State '{}' failed to unsubscribe from '{}': {}",
                        self.name,
                        sensor.name(),
                        e
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        for sensor_id in self.sensor_union() {
            if let Some(sensor) = sensors.get_mut(sensor_id.0) {
                sensor.stop();
            }
        }
        for actuator in &mut self.actuators {
            actuator.exit(ctx);
        }
        self.toggle_outputs(false, ctx);
        self.pending = None;
        self.active = false;
        if self.debug {
            debug!("State '{}' deactivated on {:?}", self.name, ctx.entity);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Handle a notification from `sensor`. Only the first firing edge of an
    /// activation window is latched.
    pub fn on_sensor_event(&mut self, sensor: SensorId) {
        if !self.active || self.pending.is_some() {
            return;
        }
        if let Some(edge) = self.transitions.iter().find(|t| t.sensor == sensor) {
            self.pending = Some(edge.target);
            if self.debug {
                debug!(
                    "State '{}' latched transition to {:?} from {:?}",
                    self.name, edge.target, sensor
                );
            }
        }
    }

    pub fn tick(&mut self, dt: f32, ctx: &mut ActuatorContext) {
        for actuator in &mut self.actuators {
            actuator.tick(dt, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::movement::{HorizontalActuator, HorizontalDirection, SpeedRamp};
    use crate::components::perception::Perception;
    use crate::components::sensor::{Detector, TimerDetector};
    use bevy_ecs::world::World;
    use glam::Vec2;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        sensors: Vec<SensorId>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Actuator for Recorder {
        fn kind(&self) -> ActuatorKind {
            ActuatorKind::Custom(self.name)
        }
        fn sensors(&self) -> &[SensorId] {
            &self.sensors
        }
        fn enter(&mut self, _ctx: &mut ActuatorContext) {
            self.log.lock().unwrap().push(format!("enter {}", self.name));
        }
        fn tick(&mut self, _dt: f32, _ctx: &mut ActuatorContext) {
            self.log.lock().unwrap().push(format!("tick {}", self.name));
        }
        fn exit(&mut self, _ctx: &mut ActuatorContext) {
            self.log.lock().unwrap().push(format!("exit {}", self.name));
        }
        fn set_debug(&mut self, _debug: bool) {}
    }

    fn timer_sensors(n: usize) -> Vec<Sensor> {
        (0..n)
            .map(|i| Sensor::new(format!("s{}", i), Detector::Timer(TimerDetector::new(1.0))))
            .collect()
    }

    struct Rig {
        agent: Entity,
        perception: Perception,
        velocity: Vec2,
        commands: Vec<AgentCommand>,
    }

    impl Rig {
        fn new() -> Self {
            let mut world = World::new();
            Rig {
                agent: world.spawn_empty().id(),
                perception: Perception::default(),
                velocity: Vec2::ZERO,
                commands: Vec::new(),
            }
        }

        fn ctx(&mut self) -> ActuatorContext<'_> {
            ActuatorContext::new(
                self.agent,
                &self.perception,
                &mut self.velocity,
                &mut self.commands,
            )
        }
    }

    #[test]
    fn test_duplicate_actuator_kind_keeps_first() {
        let mut state = BehaviorState::new("walk");
        let first = HorizontalActuator::new(SpeedRamp::constant(1.0), HorizontalDirection::Left);
        let second = HorizontalActuator::new(SpeedRamp::constant(9.0), HorizontalDirection::Right);
        assert!(state.add_actuator(Box::new(first)));
        assert!(!state.add_actuator(Box::new(second)));
        assert_eq!(state.actuator_kinds(), vec![ActuatorKind::Horizontal]);

        let mut rig = Rig::new();
        state.activate(StateId(0), &mut [], &mut rig.ctx());
        state.tick(0.1, &mut rig.ctx());
        assert_eq!(rig.velocity.x, -1.0);
    }

    #[test]
    fn test_set_actuators_validates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut state = BehaviorState::new("s");
        let mk = |name| -> Box<dyn Actuator> {
            Box::new(Recorder {
                name,
                sensors: vec![],
                log: log.clone(),
            })
        };
        state.set_actuators(vec![mk("a"), mk("b"), mk("a")]);
        assert_eq!(
            state.actuator_kinds(),
            vec![ActuatorKind::Custom("a"), ActuatorKind::Custom("b")]
        );
        assert!(state.remove_actuator(ActuatorKind::Custom("a")));
        assert!(!state.remove_actuator(ActuatorKind::Custom("a")));
    }

    #[test]
    fn test_activation_order_and_sensor_union() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sensors = timer_sensors(4);
        let mut state = BehaviorState::new("idle");
        state.add_actuator(Box::new(Recorder {
            name: "a",
            sensors: vec![SensorId(2), SensorId(0)],
            log: log.clone(),
        }));
        state.add_sensor(SensorId(0));
        state.add_sensor(SensorId(1));
        state.add_transition(SensorId(1), StateId(1));
        state.add_transition(SensorId(1), StateId(2));
        state.add_transition(SensorId(3), StateId(2));
        assert_eq!(
            state.sensor_union(),
            vec![SensorId(2), SensorId(0), SensorId(1), SensorId(3)]
        );

        let mut rig = Rig::new();
        state.activate(StateId(0), &mut sensors, &mut rig.ctx());
        assert!(sensors.iter().all(|s| s.is_active()));
        // one subscription per distinct edge sensor
        assert_eq!(sensors[1].subscriber_count(), 1);
        assert_eq!(sensors[3].subscriber_count(), 1);
        assert_eq!(sensors[0].subscriber_count(), 0);

        state.tick(0.1, &mut rig.ctx());
        state.deactivate(StateId(0), &mut sensors, &mut rig.ctx()).unwrap();
        assert!(sensors.iter().all(|s| !s.is_active()));
        assert!(sensors.iter().all(|s| s.subscriber_count() == 0));
        assert_eq!(*log.lock().unwrap(), vec!["enter a", "tick a", "exit a"]);
    }

    #[test]
    fn test_first_fired_edge_wins() {
        let mut sensors = timer_sensors(2);
        let mut state = BehaviorState::new("idle");
        state.add_transition(SensorId(0), StateId(5));
        state.add_transition(SensorId(0), StateId(6));
        state.add_transition(SensorId(1), StateId(7));

        // inactive states ignore notifications
        state.on_sensor_event(SensorId(1));
        assert_eq!(state.pending_transition(), None);

        let mut rig = Rig::new();
        state.activate(StateId(0), &mut sensors, &mut rig.ctx());
        state.on_sensor_event(SensorId(1));
        state.on_sensor_event(SensorId(0));
        assert_eq!(state.pending_transition(), Some(StateId(7)));

        state.deactivate(StateId(0), &mut sensors, &mut rig.ctx()).unwrap();
        assert_eq!(state.pending_transition(), None);

        state.activate(StateId(0), &mut sensors, &mut rig.ctx());
        state.on_sensor_event(SensorId(0));
        assert_eq!(state.pending_transition(), Some(StateId(5)));
        // a fresh activation window clears the latch
        state.deactivate(StateId(0), &mut sensors, &mut rig.ctx()).unwrap();
        state.activate(StateId(0), &mut sensors, &mut rig.ctx());
        assert_eq!(state.pending_transition(), None);
    }

    #[test]
    fn test_activate_twice_keeps_one_subscription() {
        let mut sensors = timer_sensors(1);
        let mut state = BehaviorState::new("idle");
        state.add_transition(SensorId(0), StateId(1));

        let mut rig = Rig::new();
        state.activate(StateId(0), &mut sensors, &mut rig.ctx());
        state.on_sensor_event(SensorId(0));
        state.activate(StateId(0), &mut sensors, &mut rig.ctx());
        assert_eq!(sensors[0].subscriber_count(), 1);
        assert_eq!(state.pending_transition(), Some(StateId(1)));

        state.deactivate(StateId(0), &mut sensors, &mut rig.ctx()).unwrap();
        assert_eq!(sensors[0].subscriber_count(), 0);
    }

    #[test]
    fn test_emitters_and_damage_sensing_toggled() {
        let mut world = World::new();
        let emitter = world.spawn_empty().id();
        let mut state = BehaviorState::new("attack");
        state.add_emitter(emitter);
        state.add_emitter(emitter);
        state.set_damage_sensing(true);

        let mut rig = Rig::new();
        let agent = rig.agent;
        state.activate(StateId(0), &mut [], &mut rig.ctx());
        state.deactivate(StateId(0), &mut [], &mut rig.ctx()).unwrap();
        assert_eq!(
            rig.commands,
            vec![
                AgentCommand::SetEmitting {
                    emitter,
                    emitting: true
                },
                AgentCommand::SetDamageSensing {
                    entity: agent,
                    active: true
                },
                AgentCommand::SetEmitting {
                    emitter,
                    emitting: false
                },
                AgentCommand::SetDamageSensing {
                    entity: agent,
                    active: false
                },
            ]
        );
    }

    #[test]
    fn test_deactivate_reports_broken_subscription_but_finishes() {
        let mut sensors = timer_sensors(2);
        let mut state = BehaviorState::new("idle");
        state.add_transition(SensorId(0), StateId(1));
        state.add_transition(SensorId(1), StateId(1));

        let mut rig = Rig::new();
        state.activate(StateId(0), &mut sensors, &mut rig.ctx());
        // someone else removed our subscription behind our back
        sensors[0].unsubscribe(StateId(0)).unwrap();

        let err = state
            .deactivate(StateId(0), &mut sensors, &mut rig.ctx())
            .unwrap_err();
        assert!(matches!(err, BehaviorError::SubscriptionUnderflow));
        assert_eq!(sensors[1].subscriber_count(), 0);
        assert!(!sensors[1].is_active());
        assert!(!state.is_active());
    }
}
