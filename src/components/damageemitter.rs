//! Declarative damage descriptor.
//!
//! A [`DamageEmitter`] sits on anything that hurts on contact (spikes, an
//! enemy's hitbox, a projectile). It carries no logic: the receiving agent's
//! [`Life`](super::life::Life) interprets it according to [`DamageType`].
//! Damage is only delivered while `emitting` is true; behavior states turn
//! their emitters on while active.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Applied once on contact begin.
    #[default]
    Instant,
    /// Applied on contact begin and then every `cooldown` while in contact.
    Persistent,
    /// Applied on contact begin, then `residual_applications` times every
    /// `cooldown`, whether or not contact continues.
    Residual,
}

#[derive(Component, Clone, Debug, PartialEq)]
pub struct DamageEmitter {
    pub damage_type: DamageType,
    pub amount: f32,
    pub insta_kill: bool,
    pub cooldown: f32,
    pub residual_amount: f32,
    pub residual_applications: u32,
    /// The emitter's owner is removed when it hits a damage sensor.
    pub destroy_after_damage: bool,
    pub emitting: bool,
}

impl Default for DamageEmitter {
    fn default() -> Self {
        DamageEmitter {
            damage_type: DamageType::Instant,
            amount: 0.0,
            insta_kill: false,
            cooldown: 1.0,
            residual_amount: 0.0,
            residual_applications: 0,
            destroy_after_damage: false,
            emitting: false,
        }
    }
}

impl DamageEmitter {
    pub fn instant(amount: f32) -> Self {
        DamageEmitter {
            amount,
            ..Default::default()
        }
    }

    pub fn persistent(amount: f32, cooldown: f32) -> Self {
        DamageEmitter {
            damage_type: DamageType::Persistent,
            amount,
            cooldown: cooldown.max(0.0),
            ..Default::default()
        }
    }

    pub fn residual(amount: f32, residual_amount: f32, applications: u32, cooldown: f32) -> Self {
        DamageEmitter {
            damage_type: DamageType::Residual,
            amount,
            cooldown: cooldown.max(0.0),
            residual_amount,
            residual_applications: applications,
            ..Default::default()
        }
    }

    pub fn with_insta_kill(mut self) -> Self {
        self.insta_kill = true;
        self
    }

    pub fn with_destroy_after_damage(mut self) -> Self {
        self.destroy_after_damage = true;
        self
    }

    /// Start emitting without waiting for a state to enable it.
    pub fn active_from_start(mut self) -> Self {
        self.emitting = true;
        self
    }

    pub fn set_emitting(&mut self, emitting: bool) {
        self.emitting = emitting;
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }
}
