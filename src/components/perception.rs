//! Per-frame world snapshot consumed by sensors and actuators.
//!
//! The physics collaborator fills a [`Perception`] every frame: the agent's
//! own position, the positions and extents of the targets it may care about,
//! and the contact events reported for it this frame. Sensors and actuators
//! never query the world directly; everything they can see is in here.
//!
//! Coordinates are y-up: "up" is `+y`, "left" is `-x`.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A world axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Component of `v` along this axis.
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// True when `normal` points mostly along this axis.
    ///
    /// Ties count for neither axis.
    pub fn dominates(self, normal: Vec2) -> bool {
        match self {
            Axis::X => normal.x.abs() > normal.y.abs(),
            Axis::Y => normal.y.abs() > normal.x.abs(),
        }
    }
}

/// Phase of a contact between two colliders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPhase {
    Begin,
    Stay,
    End,
}

/// Bit set of collision layers. Layer `n` is bit `1 << n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn single(layer: u8) -> Self {
        LayerMask(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    pub fn contains(self, layer: u8) -> bool {
        self.0 & LayerMask::single(layer).0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

/// One contact reported by the physics collaborator for this frame.
///
/// `normal` points from `other` towards the perceiving agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub other: Entity,
    pub phase: ContactPhase,
    pub layer: u8,
    pub normal: Vec2,
}

/// Position and collider half extents of a known target.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TargetInfo {
    pub position: Vec2,
    pub half_extents: Vec2,
}

/// What an agent knows about the world this frame.
#[derive(Component, Clone, Debug, Default)]
pub struct Perception {
    pub position: Vec2,
    pub targets: FxHashMap<Entity, TargetInfo>,
    pub contacts: Vec<Contact>,
}

impl Perception {
    pub fn new(position: Vec2) -> Self {
        Perception {
            position,
            ..Default::default()
        }
    }

    pub fn target(&self, entity: Entity) -> Option<&TargetInfo> {
        self.targets.get(&entity)
    }

    pub fn set_target(&mut self, entity: Entity, position: Vec2, half_extents: Vec2) {
        self.targets.insert(
            entity,
            TargetInfo {
                position,
                half_extents,
            },
        );
    }

    pub fn forget_target(&mut self, entity: Entity) {
        self.targets.remove(&entity);
    }

    pub fn push_contact(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// Contacts with `other` reported this frame.
    pub fn contacts_with(&self, other: Entity) -> impl Iterator<Item = &Contact> {
        self.contacts.iter().filter(move |c| c.other == other)
    }

    /// Drop this frame's contacts. Targets persist across frames.
    pub fn clear_contacts(&mut self) {
        self.contacts.clear();
    }
}
