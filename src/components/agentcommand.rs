//! Side effects requested by behavior code.
//!
//! States and actuators run inside a
//! [`BehaviorMachine`](super::behaviormachine::BehaviorMachine) without access
//! to the ECS world. Whatever they need done outside the machine is pushed as
//! an [`AgentCommand`] into the machine's outbox, which the behavior system
//! drains and applies once per frame.

use bevy_ecs::prelude::Entity;

use crate::events::animation::AnimationCmd;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AgentCommand {
    /// Toggle the `emitting` flag of a damage emitter.
    SetEmitting { emitter: Entity, emitting: bool },
    /// Start or stop the damage sensor of an agent.
    SetDamageSensing { entity: Entity, active: bool },
    /// Forward to the animation provider, if the entity has one.
    Animate(AnimationCmd),
    /// Remove the entity: die animation when animated, despawn otherwise.
    Destroy { entity: Entity },
}
