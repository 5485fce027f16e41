//! Health and damage accrual.
//!
//! [`Life`] turns damage-sensor notifications into health changes. Each
//! notification carries the emitter that was touched; `Life` takes a
//! snapshot of that emitter's policy and applies it:
//!
//! | type       | on contact begin                        | every tick                                   | on contact end |
//! |------------|-----------------------------------------|----------------------------------------------|----------------|
//! | Instant    | `amount`, or health to 0 on insta-kill  | nothing                                      | nothing        |
//! | Persistent | `amount`, reset elapsed                 | while in contact: `amount` each `cooldown`   | stops          |
//! | Residual   | `amount`, re-seed applications          | while applications remain: `residual_amount` | keeps going    |
//!
//! Health is clamped to `[0, max]` after every change. Outcomes are queued
//! as [`LifeEffect`]s for the life system to turn into animations and
//! [`DeathEvent`](crate::events::behavior::DeathEvent)s. Death is reported once
//! and re-armed when health rises above zero again.

use bevy_ecs::prelude::{Component, Entity};
use log::debug;

use super::damageemitter::{DamageEmitter, DamageType};

/// Something the life system should react to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LifeEffect {
    Damaged { amount: f32 },
    Died,
}

/// Emitter parameters captured when accrual was seeded.
#[derive(Clone, Copy, Debug, PartialEq)]
struct AccrualPolicy {
    damage_type: DamageType,
    amount: f32,
    residual_amount: f32,
    cooldown: f32,
}

#[derive(Component, Clone, Debug)]
pub struct Life {
    current: f32,
    initial: f32,
    max: f32,
    policy: Option<AccrualPolicy>,
    source: Option<Entity>,
    contact_active: bool,
    cooldown_elapsed: f32,
    residual_remaining: u32,
    dead: bool,
    effects: Vec<LifeEffect>,
}

impl Life {
    /// `initial` is clamped to `[0, max]` like every other health value.
    pub fn new(initial: f32, max: f32) -> Self {
        let max = max.max(0.0);
        let initial = initial.clamp(0.0, max);
        Life {
            current: initial,
            initial,
            max,
            policy: None,
            source: None,
            contact_active: false,
            cooldown_elapsed: 0.0,
            residual_remaining: 0,
            dead: false,
            effects: Vec::new(),
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn initial(&self) -> f32 {
        self.initial
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Emitter that seeded the running accrual, if any.
    pub fn source(&self) -> Option<Entity> {
        self.source
    }

    pub fn is_contact_active(&self) -> bool {
        self.contact_active
    }

    pub fn residual_remaining(&self) -> u32 {
        self.residual_remaining
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn is_below(&self, value: f32) -> bool {
        self.current < value
    }

    pub fn set_initial(&mut self, value: f32) {
        self.initial = value.clamp(0.0, self.max);
    }

    /// Stop persistent accrual without an end report, for contacts that can
    /// no longer end normally (emitter gone or silenced, sensor stopped).
    /// Pending residual applications keep running.
    pub fn end_contact(&mut self) {
        if self.contact_active {
            self.contact_active = false;
            debug!("Life: contact with {:?} dropped", self.source);
        }
    }

    /// React to a damage-sensor report about `emitter_entity`.
    /// `contact` is true for a contact begin and false for an end.
    pub fn receive(&mut self, emitter_entity: Entity, emitter: &DamageEmitter, contact: bool) {
        if !contact {
            if self.source == Some(emitter_entity) {
                self.contact_active = false;
            }
            return;
        }
        match emitter.damage_type {
            DamageType::Instant => {
                if emitter.insta_kill {
                    self.set_health(0.0);
                } else {
                    self.apply_damage(emitter.amount);
                }
            }
            DamageType::Persistent | DamageType::Residual => {
                self.policy = Some(AccrualPolicy {
                    damage_type: emitter.damage_type,
                    amount: emitter.amount,
                    residual_amount: emitter.residual_amount,
                    cooldown: emitter.cooldown,
                });
                self.source = Some(emitter_entity);
                self.contact_active = true;
                self.cooldown_elapsed = 0.0;
                self.residual_remaining = if emitter.damage_type == DamageType::Residual {
                    emitter.residual_applications
                } else {
                    0
                };
                self.apply_damage(emitter.amount);
            }
        }
    }

    /// Advance periodic damage by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let Some(policy) = self.policy else {
            return;
        };
        match policy.damage_type {
            DamageType::Persistent if self.contact_active => {
                self.cooldown_elapsed += dt;
                if self.cooldown_elapsed >= policy.cooldown {
                    self.cooldown_elapsed = 0.0;
                    self.apply_damage(policy.amount);
                }
            }
            DamageType::Residual if self.residual_remaining > 0 => {
                self.cooldown_elapsed += dt;
                if self.cooldown_elapsed >= policy.cooldown {
                    self.cooldown_elapsed = 0.0;
                    self.residual_remaining -= 1;
                    self.apply_damage(policy.residual_amount);
                }
            }
            _ => {}
        }
    }

    pub fn apply_damage(&mut self, amount: f32) {
        self.current = (self.current - amount).clamp(0.0, self.max);
        self.effects.push(LifeEffect::Damaged { amount });
        debug!("Life: took {} damage, now {}", amount, self.current);
        self.check_death();
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
        self.check_death();
    }

    pub fn set_health(&mut self, value: f32) {
        self.current = value.clamp(0.0, self.max);
        self.check_death();
    }

    pub fn reset_to_initial(&mut self) {
        self.set_health(self.initial);
    }

    pub fn drain_effects(&mut self) -> Vec<LifeEffect> {
        std::mem::take(&mut self.effects)
    }

    fn check_death(&mut self) {
        if self.current <= 0.0 {
            if !self.dead {
                self.dead = true;
                self.effects.push(LifeEffect::Died);
            }
        } else {
            self.dead = false;
        }
    }
}
