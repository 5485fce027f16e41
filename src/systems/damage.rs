//! Damage pipeline systems.
//!
//! Contact with an emitting [`DamageEmitter`] reaches an agent's [`Life`]
//! through its [`DamageSensor`]:
//!
//! 1. [`start_damage_sensors`] / [`attach_life_system`] – wiring on spawn
//! 2. [`end_damage_contacts_system`] – contact ends and dropped contacts
//! 3. [`life_tick_system`] – periodic persistent/residual damage
//! 4. [`damage_sensor_system`] – new contacts with emitters, reported to `Life`
//! 5. [`life_effects_system`] – damage/death animations and [`DeathEvent`]s
//!
//! A frame's contact ends are seen before periodic damage ticks, so contact
//! over `[0, t)` never pays for the tick at `t`. New contacts come after the
//! tick, so an accrual seeded this frame starts counting from the next one.

use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::components::damageemitter::DamageEmitter;
use crate::components::damagesensor::DamageSensor;
use crate::components::life::{Life, LifeEffect};
use crate::components::perception::{ContactPhase, Perception};
use crate::events::animation::{AnimationClip, AnimationCmd};
use crate::events::behavior::DeathEvent;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::AnimationDriver;

/// Start damage sensors flagged as active from start.
pub fn start_damage_sensors(mut query: Query<&mut DamageSensor, Added<DamageSensor>>) {
    for mut sensor in query.iter_mut() {
        if sensor.starts_active() {
            sensor.start();
        }
    }
}

/// Subscribe each newly added [`Life`] to the damage sensor on its entity.
pub fn attach_life_system(
    lives: Query<Entity, Added<Life>>,
    mut sensors: Query<&mut DamageSensor>,
) {
    for entity in lives.iter() {
        match sensors.get_mut(entity) {
            Ok(mut sensor) => {
                if !sensor.is_subscribed(entity) {
                    sensor.subscribe(entity);
                }
            }
            Err(_) => warn!("{:?} has Life but no DamageSensor: it cannot be hurt", entity),
        }
    }
}

/// Stop persistent accrual for contacts that ended this frame or can no
/// longer end: the seeding emitter was despawned or stopped emitting, or the
/// damage sensor was stopped.
pub fn end_damage_contacts_system(
    mut sensors: Query<(Entity, &mut DamageSensor, &Perception)>,
    emitters: Query<&DamageEmitter>,
    mut lives: Query<&mut Life>,
) {
    for (entity, mut sensor, perception) in sensors.iter_mut() {
        for contact in &perception.contacts {
            if contact.phase != ContactPhase::End {
                continue;
            }
            let Ok(emitter) = emitters.get(contact.other) else {
                continue;
            };
            if !sensor.on_contact(contact.other, ContactPhase::End, emitter) {
                continue;
            }
            sensor.source().notify(contact.other, |subscriber, other| {
                if let Ok(mut life) = lives.get_mut(*subscriber) {
                    life.receive(other, emitter, false);
                }
            });
        }

        let sensing = sensor.is_active();
        sensor.source().notify(sensing, |subscriber, sensing| {
            let Ok(mut life) = lives.get_mut(*subscriber) else {
                return;
            };
            let Some(source) = life.source() else {
                return;
            };
            if !life.is_contact_active() {
                return;
            }
            let live = sensing && emitters.get(source).is_ok_and(|e| e.is_emitting());
            if !live {
                debug!("{:?}: contact with {:?} can no longer end, dropping it", entity, source);
                life.end_contact();
            }
        });
    }
}

pub fn life_tick_system(mut query: Query<&mut Life>, time: Res<WorldTime>) {
    for mut life in query.iter_mut() {
        life.tick(time.delta);
    }
}

pub fn damage_sensor_system(
    mut sensors: Query<(Entity, &mut DamageSensor, &Perception)>,
    emitters: Query<&DamageEmitter>,
    mut lives: Query<&mut Life>,
    mut driver: AnimationDriver,
    time: Res<WorldTime>,
) {
    for (entity, mut sensor, perception) in sensors.iter_mut() {
        if !sensor.advance(time.delta) {
            continue;
        }
        for contact in &perception.contacts {
            if contact.phase == ContactPhase::End {
                continue;
            }
            let Ok(emitter) = emitters.get(contact.other) else {
                continue;
            };
            if !sensor.on_contact(contact.other, contact.phase, emitter) {
                continue;
            }
            if emitter.destroy_after_damage {
                debug!("{:?}: emitter {:?} spent on contact", entity, contact.other);
                driver.destroy(contact.other);
            }
            let collision = sensor.has_collision_occurred();
            sensor.source().notify(contact.other, |subscriber, other| {
                match lives.get_mut(*subscriber) {
                    Ok(mut life) => life.receive(other, emitter, collision),
                    Err(_) => warn!("Damage subscriber {:?} has no Life", subscriber),
                }
            });
        }
    }
}

pub fn life_effects_system(mut query: Query<(Entity, &mut Life)>, mut driver: AnimationDriver) {
    for (entity, mut life) in query.iter_mut() {
        for effect in life.drain_effects() {
            match effect {
                LifeEffect::Damaged { amount } => {
                    debug!("{:?} took {} damage, health {}", entity, amount, life.current());
                    driver.send(AnimationCmd::Play {
                        entity,
                        clip: AnimationClip::Damage,
                    });
                }
                LifeEffect::Died => {
                    info!("{:?} health depleted", entity);
                    driver.commands.trigger(DeathEvent { entity });
                    driver.destroy(entity);
                }
            }
        }
    }
}
