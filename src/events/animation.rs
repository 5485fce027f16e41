//! Commands sent to the animation provider.
//!
//! Behavior code never talks to an animator directly. Actuators and the
//! damage pipeline produce [`AnimationCmd`] values; the behavior systems write
//! them as messages for entities that carry an enabled
//! [`Animator`](crate::components::animator::Animator). Delivery is
//! fire-and-forget.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;
use serde::{Deserialize, Serialize};

use crate::components::perception::Axis;

/// Direction an agent's sprite should face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    Right,
    Up,
    Down,
}

/// One-shot clips every animated agent is expected to provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationClip {
    Damage,
    Die,
    Spawn,
    ChangeState,
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum AnimationCmd {
    Face { entity: Entity, direction: Facing },
    Flip { entity: Entity, axis: Axis },
    Play { entity: Entity, clip: AnimationClip },
    SetSpeed { entity: Entity, axis: Axis, value: f32 },
}

impl AnimationCmd {
    /// Entity whose animator should receive this command.
    pub fn entity(&self) -> Entity {
        match *self {
            AnimationCmd::Face { entity, .. }
            | AnimationCmd::Flip { entity, .. }
            | AnimationCmd::Play { entity, .. }
            | AnimationCmd::SetSpeed { entity, .. } => entity,
        }
    }
}
