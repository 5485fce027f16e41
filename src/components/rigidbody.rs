//! Kinematic body holding an agent's velocity.
//!
//! Actuators write into [`RigidBody::velocity`]; integrating it into a
//! position is the physics collaborator's job. The `frozen` flag pins the
//! body, for example while a death clip plays.

use bevy_ecs::prelude::Component;
use glam::Vec2;
use log::warn;

#[derive(Component, Clone, Debug, Default)]
pub struct RigidBody {
    /// World units per second.
    pub velocity: Vec2,
    /// Optional clamp on velocity magnitude.
    pub max_speed: Option<f32>,
    /// While frozen, velocity is held at zero.
    pub frozen: bool,
}

impl RigidBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_velocity(velocity: Vec2) -> Self {
        RigidBody {
            velocity,
            ..Default::default()
        }
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = Some(max_speed);
        self
    }

    /// Stop and pin the body.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.velocity = Vec2::ZERO;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Apply the frozen flag and speed clamp after actuators have run.
    pub fn settle(&mut self) {
        if self.frozen {
            self.velocity = Vec2::ZERO;
            return;
        }
        if let Some(max) = self.max_speed {
            self.velocity = self.velocity.clamp_length_max(max);
        }
    }

    /// Set speed while keeping the current direction. No-op at rest.
    pub fn set_speed(&mut self, new_speed: f32) {
        if self.velocity.length() > 0.0 {
            self.velocity = self.velocity.normalize() * new_speed;
        } else {
            warn!("RigidBody::set_speed called with zero velocity - operation ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_freeze_zeroes_velocity() {
        let mut rb = RigidBody::with_velocity(Vec2::new(3.0, 4.0));
        rb.freeze();
        assert_eq!(rb.velocity, Vec2::ZERO);
        rb.velocity = Vec2::new(1.0, 0.0);
        rb.settle();
        assert_eq!(rb.velocity, Vec2::ZERO);
        rb.unfreeze();
        rb.velocity = Vec2::new(1.0, 0.0);
        rb.settle();
        assert_eq!(rb.velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_max_speed_clamp() {
        let mut rb = RigidBody::with_velocity(Vec2::new(30.0, 40.0)).with_max_speed(5.0);
        rb.settle();
        assert!(approx_eq(rb.velocity.length(), 5.0));
        assert!(approx_eq(rb.velocity.x, 3.0));
    }

    #[test]
    fn test_set_speed_keeps_direction() {
        let mut rb = RigidBody::with_velocity(Vec2::new(-3.0, -4.0));
        rb.set_speed(10.0);
        assert!(approx_eq(rb.velocity.x, -6.0));
        assert!(approx_eq(rb.velocity.y, -8.0));
        let mut still = RigidBody::new();
        still.set_speed(10.0);
        assert_eq!(still.velocity, Vec2::ZERO);
    }
}
