//! Contact events reported by the physics collaborator.
//!
//! Whatever does collision detection triggers one [`ContactEvent`] per
//! perceiving entity and contact phase. The [`observe_contact_event`]
//! observer files each event into that entity's
//! [`Perception`](crate::components::perception::Perception), where sensors,
//! actuators and the damage sensor pick it up during the next systems pass.
//! Contacts are cleared at the end of every frame by
//! [`clear_contacts_system`](crate::systems::perception::clear_contacts_system).
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, warn};

use crate::components::perception::{Contact, ContactPhase, Perception};

/// A contact between `entity` and `other`, as seen from `entity`.
///
/// `normal` points from `other` towards `entity`. `layer` is `other`'s
/// collision layer.
#[derive(Event, Debug, Clone, Copy)]
pub struct ContactEvent {
    pub entity: Entity,
    pub other: Entity,
    pub phase: ContactPhase,
    pub layer: u8,
    pub normal: Vec2,
}

impl ContactEvent {
    pub fn new(entity: Entity, other: Entity, phase: ContactPhase) -> Self {
        ContactEvent {
            entity,
            other,
            phase,
            layer: 0,
            normal: Vec2::ZERO,
        }
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_normal(mut self, normal: Vec2) -> Self {
        self.normal = normal;
        self
    }
}

/// Global observer routing contacts into the perceiving entity's
/// [`Perception`].
///
/// Entities without a `Perception` cannot perceive anything; their contacts
/// are dropped with a warning.
pub fn observe_contact_event(trigger: On<ContactEvent>, mut perceptions: Query<&mut Perception>) {
    let event = *trigger.event();
    match perceptions.get_mut(event.entity) {
        Ok(mut perception) => {
            debug!(
                "Contact {:?}: {:?} with {:?} (layer {})",
                event.phase, event.entity, event.other, event.layer
            );
            perception.push_contact(Contact {
                other: event.other,
                phase: event.phase,
                layer: event.layer,
                normal: event.normal,
            });
        }
        Err(_) => warn!(
            "ContactEvent for {:?} dropped: entity has no Perception",
            event.entity
        ),
    }
}
