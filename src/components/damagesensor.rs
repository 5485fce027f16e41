//! Sensor reporting contact with damage emitters.
//!
//! The [`DamageSensor`] shares the gate of regular sensors (active flag and
//! warm-up) but is a component of its own: it watches the agent's contacts
//! for colliders carrying an emitting
//! [`DamageEmitter`](super::damageemitter::DamageEmitter) and notifies its
//! subscribers, normally the agent's [`Life`](super::life::Life).
//!
//! It is started either by a behavior state with damage sensing enabled or,
//! when `active_from_start` is set, as soon as it is added to an entity.

use bevy_ecs::prelude::{Component, Entity};
use log::debug;
use smallvec::SmallVec;

use super::damageemitter::DamageEmitter;
use super::eventsource::EventSource;
use super::perception::ContactPhase;
use super::sensor::{SensorGate, SensorKind};
use crate::error::BehaviorError;

#[derive(Component, Clone, Debug)]
pub struct DamageSensor {
    gate: SensorGate,
    source: EventSource<Entity>,
    emitter: Option<Entity>,
    collision: bool,
    touching: SmallVec<[Entity; 4]>,
    active_from_start: bool,
    debug: bool,
}

impl Default for DamageSensor {
    fn default() -> Self {
        DamageSensor::new(0.0)
    }
}

impl DamageSensor {
    pub fn new(warmup: f32) -> Self {
        DamageSensor {
            gate: SensorGate::new(warmup),
            source: EventSource::new(),
            emitter: None,
            collision: false,
            touching: SmallVec::new(),
            active_from_start: false,
            debug: false,
        }
    }

    /// Start as soon as the component is attached, without a state.
    pub fn active_from_start(mut self) -> Self {
        self.active_from_start = true;
        self
    }

    pub fn starts_active(&self) -> bool {
        self.active_from_start
    }

    pub fn kind(&self) -> SensorKind {
        SensorKind::Damage
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn start(&mut self) {
        self.gate.start();
        self.collision = false;
        self.touching.clear();
    }

    pub fn stop(&mut self) {
        self.gate.stop();
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    /// Advance the warm-up. Returns whether contacts are processed this
    /// frame.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.gate.advance(dt)
    }

    /// Emitter of the last reported contact.
    pub fn emitter(&self) -> Option<Entity> {
        self.emitter
    }

    /// True if the last reported contact was a begin, false if an end.
    pub fn has_collision_occurred(&self) -> bool {
        self.collision
    }

    /// Feed one contact with `other`, which carries `emitter`.
    ///
    /// Returns true when the contact is reportable. Ends are always
    /// reported so a running accrual can stop. Begins, and stays with an
    /// emitter not yet in contact, need a ready sensor and an emitting
    /// emitter.
    pub fn on_contact(&mut self, other: Entity, phase: ContactPhase, emitter: &DamageEmitter) -> bool {
        if phase != ContactPhase::End && (!self.gate.is_ready() || !emitter.emitting) {
            return false;
        }
        let reported = match phase {
            ContactPhase::Begin => {
                if !self.touching.contains(&other) {
                    self.touching.push(other);
                }
                self.collision = true;
                true
            }
            ContactPhase::Stay => {
                if self.touching.contains(&other) {
                    false
                } else {
                    self.touching.push(other);
                    self.collision = true;
                    true
                }
            }
            ContactPhase::End => {
                self.touching.retain(|e| *e != other);
                self.collision = false;
                true
            }
        };
        if reported {
            self.emitter = Some(other);
            if self.debug {
                debug!("Damage sensor: {:?} contact with emitter {:?}", phase, other);
            }
        }
        reported
    }

    pub fn subscribe(&mut self, subscriber: Entity) {
        self.source.subscribe(subscriber);
    }

    pub fn unsubscribe(&mut self, subscriber: Entity) -> Result<(), BehaviorError> {
        self.source.unsubscribe(&subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.source.subscriber_count()
    }

    pub fn is_subscribed(&self, subscriber: Entity) -> bool {
        self.source.is_subscribed(&subscriber)
    }

    pub fn source(&self) -> &EventSource<Entity> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    fn two() -> (Entity, Entity) {
        let mut world = World::new();
        (world.spawn_empty().id(), world.spawn_empty().id())
    }

    #[test]
    fn test_inactive_or_silent_emitter_ignored() {
        let (spikes, _) = two();
        let emitter = DamageEmitter::instant(1.0).active_from_start();
        let mut sensor = DamageSensor::new(0.0);
        assert!(!sensor.on_contact(spikes, ContactPhase::Begin, &emitter));
        sensor.start();
        let silent = DamageEmitter::instant(1.0);
        assert!(!sensor.on_contact(spikes, ContactPhase::Begin, &silent));
        assert!(sensor.on_contact(spikes, ContactPhase::Begin, &emitter));
        assert_eq!(sensor.emitter(), Some(spikes));
        assert!(sensor.has_collision_occurred());
    }

    #[test]
    fn test_stay_counts_as_begin_once() {
        let (lava, _) = two();
        let emitter = DamageEmitter::persistent(2.0, 1.0).active_from_start();
        let mut sensor = DamageSensor::new(0.5);
        sensor.start();
        // still warming up while overlapping
        assert!(!sensor.advance(0.25));
        assert!(!sensor.on_contact(lava, ContactPhase::Begin, &emitter));
        assert!(sensor.advance(0.25));
        assert!(sensor.on_contact(lava, ContactPhase::Stay, &emitter));
        assert!(!sensor.on_contact(lava, ContactPhase::Stay, &emitter));
        assert!(sensor.on_contact(lava, ContactPhase::End, &emitter));
        assert!(!sensor.has_collision_occurred());
    }

    #[test]
    fn test_end_reported_when_stopped_or_silent() {
        let (lava, _) = two();
        let mut emitter = DamageEmitter::persistent(2.0, 1.0).active_from_start();
        let mut sensor = DamageSensor::new(0.0);
        sensor.start();
        assert!(sensor.on_contact(lava, ContactPhase::Begin, &emitter));
        emitter.set_emitting(false);
        assert!(sensor.on_contact(lava, ContactPhase::End, &emitter));
        assert!(!sensor.has_collision_occurred());

        emitter.set_emitting(true);
        assert!(sensor.on_contact(lava, ContactPhase::Begin, &emitter));
        sensor.stop();
        assert!(sensor.on_contact(lava, ContactPhase::End, &emitter));
        assert!(!sensor.on_contact(lava, ContactPhase::Begin, &emitter));
    }

    #[test]
    fn test_restart_forgets_contacts() {
        let (lava, _) = two();
        let emitter = DamageEmitter::persistent(2.0, 1.0).active_from_start();
        let mut sensor = DamageSensor::new(0.0);
        sensor.start();
        assert!(sensor.on_contact(lava, ContactPhase::Begin, &emitter));
        sensor.stop();
        assert!(!sensor.on_contact(lava, ContactPhase::Stay, &emitter));
        sensor.start();
        assert!(sensor.on_contact(lava, ContactPhase::Stay, &emitter));
    }

    #[test]
    fn test_subscribers() {
        let (agent, other) = two();
        let mut sensor = DamageSensor::default();
        assert_eq!(sensor.kind(), SensorKind::Damage);
        sensor.subscribe(agent);
        assert!(sensor.is_subscribed(agent));
        assert!(matches!(
            sensor.unsubscribe(other),
            Err(BehaviorError::UnknownSubscriber(_))
        ));
        sensor.unsubscribe(agent).unwrap();
        assert!(matches!(
            sensor.unsubscribe(agent),
            Err(BehaviorError::SubscriptionUnderflow)
        ));
    }
}
