//! Contact detection between box colliders.
//!
//! A minimal stand-in for a physics engine: every frame each pair of
//! overlapping [`BoxCollider`]s produces a [`ContactEvent`] for both sides,
//! with a begin, stay or end phase depending on the previous frame. Events
//! are routed into each side's
//! [`Perception`](crate::components::perception::Perception) by
//! [`observe_contact_event`](crate::events::collision::observe_contact_event).
use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::boxcollider::BoxCollider;
use crate::components::perception::{ContactPhase, Perception};
use crate::events::collision::ContactEvent;
use crate::resources::contactpairs::ContactPairs;

pub fn contact_detection_system(
    query: Query<(Entity, &Perception, &BoxCollider)>,
    mut pairs: ResMut<ContactPairs>,
    mut commands: Commands,
) {
    let mut touching = FxHashMap::default();

    for [(entity_a, perception_a, collider_a), (entity_b, perception_b, collider_b)] in
        query.iter_combinations()
    {
        let (pos_a, pos_b) = (perception_a.position, perception_b.position);
        if !collider_a.overlaps(pos_a, collider_b, pos_b) {
            continue;
        }
        let key = ContactPairs::key(entity_a, entity_b);
        let phase = if pairs.touching.contains_key(&key) {
            ContactPhase::Stay
        } else {
            ContactPhase::Begin
        };
        let normal_a = collider_a.contact_normal(pos_a, collider_b, pos_b);
        commands.trigger(
            ContactEvent::new(entity_a, entity_b, phase)
                .with_layer(collider_b.layer)
                .with_normal(normal_a),
        );
        commands.trigger(
            ContactEvent::new(entity_b, entity_a, phase)
                .with_layer(collider_a.layer)
                .with_normal(-normal_a),
        );
        let normal_first = if key.0 == entity_a { normal_a } else { -normal_a };
        touching.insert(key, normal_first);
    }

    for (&(a, b), &normal) in pairs.touching.iter() {
        if touching.contains_key(&(a, b)) {
            continue;
        }
        // Despawned entities get no end event.
        let (Ok((_, _, collider_a)), Ok((_, _, collider_b))) = (query.get(a), query.get(b)) else {
            continue;
        };
        commands.trigger(
            ContactEvent::new(a, b, ContactPhase::End)
                .with_layer(collider_b.layer)
                .with_normal(normal),
        );
        commands.trigger(
            ContactEvent::new(b, a, ContactPhase::End)
                .with_layer(collider_a.layer)
                .with_normal(-normal),
        );
    }

    pairs.touching = touching;
}
