//! Per-agent behavior state machine.
//!
//! A [`BehaviorMachine`] is the arena that owns an agent's
//! [`BehaviorState`]s and [`Sensor`]s, and the driver that runs them. States
//! and sensors reference each other through [`StateId`] / [`SensorId`]
//! handles only.
//!
//! Each [`tick`](BehaviorMachine::tick):
//! 1. enters the initial state on the very first tick
//! 2. updates every sensor and dispatches fired sensors to their subscribers
//! 3. ticks the current state's actuators
//! 4. polls the current state's pending transition and swaps states if set
//!
//! Side effects (emitter toggles, animation commands, destroy requests)
//! accumulate in an outbox that the behavior system drains every frame, in
//! the same way scripted phases hand commands back to the engine.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use log::{debug, info, warn};

use super::actuator::ActuatorContext;
use super::agentcommand::AgentCommand;
use super::behaviorstate::{BehaviorState, StateId};
use super::perception::Perception;
use super::sensor::{Sensor, SensorId};
use crate::error::BehaviorError;
use crate::events::animation::{AnimationClip, AnimationCmd};

/// Outcome of one machine tick, for the owner to act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateTransition {
    Stay,
    /// The initial state was entered.
    Entered(StateId),
    Switched { from: StateId, to: StateId },
}

#[derive(Component, Debug, Default)]
pub struct BehaviorMachine {
    states: Vec<BehaviorState>,
    sensors: Vec<Sensor>,
    initial: Option<StateId>,
    current: Option<StateId>,
    commands: Vec<AgentCommand>,
    debug: bool,
}

impl BehaviorMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state. The first state added becomes the initial state.
    pub fn add_state(&mut self, state: BehaviorState) -> StateId {
        let id = StateId(self.states.len());
        let mut state = state;
        if self.debug {
            state.set_debug(true);
        }
        self.states.push(state);
        if self.initial.is_none() {
            self.initial = Some(id);
        }
        id
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> SensorId {
        let id = SensorId(self.sensors.len());
        let mut sensor = sensor;
        if self.debug {
            sensor.set_debug(true);
        }
        self.sensors.push(sensor);
        id
    }

    pub fn set_initial(&mut self, id: StateId) {
        if id.0 < self.states.len() {
            self.initial = Some(id);
        } else {
            warn!("Ignoring unknown initial state {:?}", id);
        }
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.initial
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current
            .and_then(|id| self.states.get(id.0))
            .map(|s| s.name())
    }

    pub fn state(&self, id: StateId) -> Option<&BehaviorState> {
        self.states.get(id.0)
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut BehaviorState> {
        self.states.get_mut(id.0)
    }

    pub fn sensor(&self, id: SensorId) -> Option<&Sensor> {
        self.sensors.get(id.0)
    }

    pub fn sensor_mut(&mut self, id: SensorId) -> Option<&mut Sensor> {
        self.sensors.get_mut(id.0)
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name() == name)
            .map(StateId)
    }

    pub fn sensor_id(&self, name: &str) -> Option<SensorId> {
        self.sensors
            .iter()
            .position(|s| s.name() == name)
            .map(SensorId)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        for state in &mut self.states {
            state.set_debug(debug);
        }
        for sensor in &mut self.sensors {
            sensor.set_debug(debug);
        }
    }

    /// Take every side effect produced since the last drain.
    pub fn drain_commands(&mut self) -> Vec<AgentCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Advance the machine by `dt` seconds.
    ///
    /// On a failed unsubscription during a swap the swap still completes and
    /// the error is returned.
    pub fn tick(
        &mut self,
        dt: f32,
        entity: Entity,
        perception: &Perception,
        velocity: &mut Vec2,
    ) -> Result<StateTransition, BehaviorError> {
        let mut outcome = StateTransition::Stay;
        let current = match self.current {
            Some(id) => id,
            None => {
                let Some(initial) = self.initial else {
                    return Ok(StateTransition::Stay);
                };
                let mut ctx = ActuatorContext::new(entity, perception, velocity, &mut self.commands);
                self.states[initial.0].activate(initial, &mut self.sensors, &mut ctx);
                ctx.push(AgentCommand::Animate(AnimationCmd::Play {
                    entity,
                    clip: AnimationClip::Spawn,
                }));
                self.current = Some(initial);
                info!(
                    "{:?} entered initial state '{}'",
                    entity,
                    self.states[initial.0].name()
                );
                outcome = StateTransition::Entered(initial);
                initial
            }
        };

        let states = &mut self.states;
        for (index, sensor) in self.sensors.iter_mut().enumerate() {
            if sensor.update(dt, perception) {
                sensor.source().notify(SensorId(index), |state, origin| {
                    if let Some(state) = states.get_mut(state.0) {
                        state.on_sensor_event(origin);
                    }
                });
            }
        }

        let mut ctx = ActuatorContext::new(entity, perception, velocity, &mut self.commands);
        self.states[current.0].tick(dt, &mut ctx);

        let Some(target) = self.states[current.0].pending_transition() else {
            return Ok(outcome);
        };
        if target.0 >= self.states.len() {
            warn!("{:?}: transition to unknown state {:?} ignored", entity, target);
            return Ok(outcome);
        }
        let result = self.states[current.0].deactivate(current, &mut self.sensors, &mut ctx);
        self.states[target.0].activate(target, &mut self.sensors, &mut ctx);
        ctx.push(AgentCommand::Animate(AnimationCmd::Play {
            entity,
            clip: AnimationClip::ChangeState,
        }));
        self.current = Some(target);
        if self.debug {
            debug!(
                "{:?}: '{}' -> '{}'",
                entity,
                self.states[current.0].name(),
                self.states[target.0].name()
            );
        }
        result.map(|_| StateTransition::Switched {
            from: current,
            to: target,
        })
    }

    /// Deactivate the current state, if any. The next tick re-enters the
    /// initial state.
    pub fn shutdown(
        &mut self,
        entity: Entity,
        perception: &Perception,
        velocity: &mut Vec2,
    ) -> Result<(), BehaviorError> {
        let Some(current) = self.current.take() else {
            return Ok(());
        };
        let mut ctx = ActuatorContext::new(entity, perception, velocity, &mut self.commands);
        self.states[current.0].deactivate(current, &mut self.sensors, &mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::movement::{
        HorizontalActuator, HorizontalDirection, SpeedRamp, VerticalActuator, VerticalDirection,
    };
    use crate::components::sensor::{
        Condition, Detector, DistanceDetector, DistanceMode, TimerDetector,
    };
    use bevy_ecs::world::World;

    fn spawn_two() -> (Entity, Entity) {
        let mut world = World::new();
        (world.spawn_empty().id(), world.spawn_empty().id())
    }

    /// patrol --(player near)--> chase --(player far)--> patrol
    fn patrol_chase(player: Entity) -> BehaviorMachine {
        let mut machine = BehaviorMachine::new();
        let near = machine.add_sensor(Sensor::new(
            "near",
            Detector::Distance(DistanceDetector::new(Some(player), DistanceMode::Magnitude, 3.0)),
        ));
        let far = machine.add_sensor(Sensor::new(
            "far",
            Detector::Distance(
                DistanceDetector::new(Some(player), DistanceMode::Magnitude, 6.0)
                    .with_condition(Condition::Outside),
            ),
        ));
        let mut patrol = BehaviorState::new("patrol");
        patrol.add_actuator(Box::new(HorizontalActuator::new(
            SpeedRamp::constant(1.0),
            HorizontalDirection::Left,
        )));
        let mut chase = BehaviorState::new("chase");
        chase.add_actuator(Box::new(
            HorizontalActuator::new(SpeedRamp::constant(4.0), HorizontalDirection::Left)
                .following(player),
        ));
        let patrol_id = machine.add_state(patrol);
        let chase_id = machine.add_state(chase);
        machine
            .state_mut(patrol_id)
            .unwrap()
            .add_transition(near, chase_id);
        machine
            .state_mut(chase_id)
            .unwrap()
            .add_transition(far, patrol_id);
        machine
    }

    #[test]
    fn test_empty_machine_stays() {
        let (agent, _) = spawn_two();
        let mut machine = BehaviorMachine::new();
        let mut velocity = Vec2::ZERO;
        let out = machine
            .tick(0.1, agent, &Perception::default(), &mut velocity)
            .unwrap();
        assert_eq!(out, StateTransition::Stay);
        assert_eq!(machine.current_state(), None);
    }

    #[test]
    fn test_enters_initial_then_switches_and_back() {
        let (agent, player) = spawn_two();
        let mut machine = patrol_chase(player);
        let mut perception = Perception::new(Vec2::ZERO);
        perception.set_target(player, Vec2::new(10.0, 0.0), Vec2::splat(0.5));
        let mut velocity = Vec2::ZERO;

        let out = machine.tick(0.1, agent, &perception, &mut velocity).unwrap();
        assert_eq!(out, StateTransition::Entered(StateId(0)));
        assert_eq!(velocity.x, -1.0);

        perception.set_target(player, Vec2::new(2.0, 0.0), Vec2::splat(0.5));
        let out = machine.tick(0.1, agent, &perception, &mut velocity).unwrap();
        assert_eq!(
            out,
            StateTransition::Switched {
                from: StateId(0),
                to: StateId(1)
            }
        );
        assert_eq!(machine.current_state_name(), Some("chase"));
        // subscriptions follow the current state
        let near = machine.sensor_id("near").unwrap();
        let far = machine.sensor_id("far").unwrap();
        assert_eq!(machine.sensor(near).unwrap().subscriber_count(), 0);
        assert_eq!(machine.sensor(far).unwrap().subscriber_count(), 1);
        assert!(!machine.sensor(near).unwrap().is_active());

        let out = machine.tick(0.1, agent, &perception, &mut velocity).unwrap();
        assert_eq!(out, StateTransition::Stay);
        assert_eq!(velocity.x, 4.0);

        perception.set_target(player, Vec2::new(20.0, 0.0), Vec2::splat(0.5));
        let out = machine.tick(0.1, agent, &perception, &mut velocity).unwrap();
        assert_eq!(
            out,
            StateTransition::Switched {
                from: StateId(1),
                to: StateId(0)
            }
        );
    }

    #[test]
    fn test_swap_commands_include_state_change_clip() {
        let (agent, _) = spawn_two();
        let mut machine = BehaviorMachine::new();
        let timeout = machine.add_sensor(Sensor::new(
            "timeout",
            Detector::Timer(TimerDetector::new(0.5)),
        ));
        let a = machine.add_state(BehaviorState::new("a"));
        let b = machine.add_state(BehaviorState::new("b"));
        machine.state_mut(a).unwrap().add_transition(timeout, b);
        let perception = Perception::default();
        let mut velocity = Vec2::ZERO;

        machine.tick(0.25, agent, &perception, &mut velocity).unwrap();
        let first = machine.drain_commands();
        assert!(first.contains(&AgentCommand::Animate(AnimationCmd::Play {
            entity: agent,
            clip: AnimationClip::Spawn
        })));
        let out = machine.tick(0.25, agent, &perception, &mut velocity).unwrap();
        assert_eq!(out, StateTransition::Switched { from: a, to: b });
        assert_eq!(
            machine.drain_commands(),
            vec![AgentCommand::Animate(AnimationCmd::Play {
                entity: agent,
                clip: AnimationClip::ChangeState
            })]
        );
        assert!(machine.drain_commands().is_empty());
    }

    #[test]
    fn test_shared_sensor_multiple_edges_first_wins() {
        let (agent, _) = spawn_two();
        let mut machine = BehaviorMachine::new();
        let tick = machine.add_sensor(Sensor::new("now", Detector::Timer(TimerDetector::new(0.0))));
        let start = machine.add_state(BehaviorState::new("start"));
        let left = machine.add_state(BehaviorState::new("left"));
        let right = machine.add_state(BehaviorState::new("right"));
        {
            let s = machine.state_mut(start).unwrap();
            s.add_transition(tick, left);
            s.add_transition(tick, right);
        }
        let mut velocity = Vec2::ZERO;
        let out = machine
            .tick(0.1, agent, &Perception::default(), &mut velocity)
            .unwrap();
        assert_eq!(out, StateTransition::Switched { from: start, to: left });
    }

    #[test]
    fn test_actuators_enter_before_sensors_start() {
        // The vertical actuator seeds from the current velocity; the timer
        // sensor fires on the first evaluated frame. Both happen in one tick.
        let (agent, _) = spawn_two();
        let mut machine = BehaviorMachine::new();
        let now = machine.add_sensor(Sensor::new("now", Detector::Timer(TimerDetector::new(0.0))));
        let mut fall = BehaviorState::new("fall");
        fall.add_actuator(Box::new(VerticalActuator::new(
            SpeedRamp::constant(2.0),
            VerticalDirection::Down,
        )));
        let fall = machine.add_state(fall);
        let land = machine.add_state(BehaviorState::new("land"));
        machine.state_mut(fall).unwrap().add_transition(now, land);
        let mut velocity = Vec2::ZERO;
        machine
            .tick(0.1, agent, &Perception::default(), &mut velocity)
            .unwrap();
        assert_eq!(velocity.y, -2.0);
        assert_eq!(machine.current_state(), Some(land));
    }

    #[test]
    fn test_shutdown_releases_subscriptions() {
        let (agent, player) = spawn_two();
        let mut machine = patrol_chase(player);
        let perception = Perception::default();
        let mut velocity = Vec2::ZERO;
        machine.tick(0.1, agent, &perception, &mut velocity).unwrap();
        let near = machine.sensor_id("near").unwrap();
        assert_eq!(machine.sensor(near).unwrap().subscriber_count(), 1);
        machine.shutdown(agent, &perception, &mut velocity).unwrap();
        assert_eq!(machine.sensor(near).unwrap().subscriber_count(), 0);
        assert_eq!(machine.current_state(), None);
        // shutting down twice is harmless
        machine.shutdown(agent, &perception, &mut velocity).unwrap();
    }
}
