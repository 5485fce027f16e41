//! Overlaps seen by the contact detection system on the previous frame.
//!
//! Used to tell a contact begin from a stay, and to report an end once two
//! colliders separate.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rustc_hash::FxHashMap;

#[derive(Resource, Debug, Clone, Default)]
pub struct ContactPairs {
    /// Key is `(a, b)` with `a < b`; value is the normal as seen from `a`.
    pub touching: FxHashMap<(Entity, Entity), Vec2>,
}

impl ContactPairs {
    pub fn key(a: Entity, b: Entity) -> (Entity, Entity) {
        if a < b { (a, b) } else { (b, a) }
    }

    pub fn is_touching(&self, a: Entity, b: Entity) -> bool {
        self.touching.contains_key(&Self::key(a, b))
    }
}
