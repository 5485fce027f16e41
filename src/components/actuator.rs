//! Effect producers run by behavior states.
//!
//! An [`Actuator`] goes through `enter` when its state activates, `tick`
//! every frame while the state is current, and `exit` when the state is left.
//! It sees the world only through an [`ActuatorContext`]: the agent's
//! perception, its velocity, and an outbox for side effects.
//!
//! A state holds at most one actuator per [`ActuatorKind`].

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use std::fmt::Debug;

use super::agentcommand::AgentCommand;
use super::perception::Perception;
use super::sensor::SensorId;

/// Tag used to enforce one actuator of each kind per state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActuatorKind {
    Horizontal,
    Vertical,
    /// User-defined actuator, distinguished by name.
    Custom(&'static str),
}

/// What an actuator may read and write during a lifecycle call.
pub struct ActuatorContext<'a> {
    pub entity: Entity,
    pub perception: &'a Perception,
    pub velocity: &'a mut Vec2,
    pub commands: &'a mut Vec<AgentCommand>,
}

impl<'a> ActuatorContext<'a> {
    pub fn new(
        entity: Entity,
        perception: &'a Perception,
        velocity: &'a mut Vec2,
        commands: &'a mut Vec<AgentCommand>,
    ) -> Self {
        ActuatorContext {
            entity,
            perception,
            velocity,
            commands,
        }
    }

    pub fn push(&mut self, command: AgentCommand) {
        self.commands.push(command);
    }
}

pub trait Actuator: Send + Sync + Debug {
    fn kind(&self) -> ActuatorKind;

    /// Sensors this actuator needs running while its state is active.
    fn sensors(&self) -> &[SensorId] {
        &[]
    }

    fn enter(&mut self, ctx: &mut ActuatorContext);

    fn tick(&mut self, dt: f32, ctx: &mut ActuatorContext);

    fn exit(&mut self, _ctx: &mut ActuatorContext) {}

    fn set_debug(&mut self, debug: bool);
}
