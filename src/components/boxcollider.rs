use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Axis-aligned box centered on the entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxCollider {
    pub half_extents: Vec2,
    /// Collision layer reported to whatever touches this collider.
    pub layer: u8,
}

impl BoxCollider {
    /// Create a BoxCollider with given size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_extents: Vec2::new(width.abs() * 0.5, height.abs() * 0.5),
            layer: 0,
        }
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    /// Returns (min, max) of the collider AABB for a given entity position.
    pub fn aabb(&self, position: Vec2) -> (Vec2, Vec2) {
        (position - self.half_extents, position + self.half_extents)
    }

    /// AABB vs AABB overlap test against another BoxCollider at a different entity position.
    pub fn overlaps(&self, position: Vec2, other: &Self, other_position: Vec2) -> bool {
        let (min_a, max_a) = self.aabb(position);
        let (min_b, max_b) = other.aabb(other_position);
        min_a.x < max_b.x && max_a.x > min_b.x && min_a.y < max_b.y && max_a.y > min_b.y
    }

    /// Unit normal pointing from `other` towards this collider, along the
    /// axis of least penetration.
    pub fn contact_normal(&self, position: Vec2, other: &Self, other_position: Vec2) -> Vec2 {
        let delta = position - other_position;
        let overlap = self.half_extents + other.half_extents - delta.abs();
        if overlap.x < overlap.y {
            Vec2::new(if delta.x < 0.0 { -1.0 } else { 1.0 }, 0.0)
        } else {
            Vec2::new(0.0, if delta.y < 0.0 { -1.0 } else { 1.0 })
        }
    }

    /// Point containment in world space.
    pub fn contains_point(&self, position: Vec2, point: Vec2) -> bool {
        let (min, max) = self.aabb(position);
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}
