//! Keeping each agent's [`Perception`] in sync with the world.
//!
//! - [`movement_system`] integrates positions from rigid body velocities
//! - [`refresh_targets_system`] copies the current position and collider
//!   extents of every known target into the perceiving agent
//! - [`clear_contacts_system`] drops the frame's contacts once everything has
//!   seen them; it runs last
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::warn;
use rustc_hash::FxHashMap;

use crate::components::boxcollider::BoxCollider;
use crate::components::perception::Perception;
use crate::components::rigidbody::RigidBody;
use crate::resources::worldtime::WorldTime;

pub fn movement_system(mut query: Query<(&mut Perception, &RigidBody)>, time: Res<WorldTime>) {
    for (mut perception, rigidbody) in query.iter_mut() {
        perception.position += rigidbody.velocity * time.delta;
    }
}

pub fn refresh_targets_system(mut query: Query<(Entity, &mut Perception, Option<&BoxCollider>)>) {
    let bodies: FxHashMap<Entity, (Vec2, Vec2)> = query
        .iter()
        .map(|(entity, perception, collider)| {
            let extents = collider.map(|c| c.half_extents).unwrap_or(Vec2::ZERO);
            (entity, (perception.position, extents))
        })
        .collect();

    for (entity, mut perception, _) in query.iter_mut() {
        if perception.targets.is_empty() {
            continue;
        }
        let mut gone: Vec<Entity> = Vec::new();
        for (target, info) in perception.targets.iter_mut() {
            match bodies.get(target) {
                Some(&(position, half_extents)) => {
                    info.position = position;
                    info.half_extents = half_extents;
                }
                None => gone.push(*target),
            }
        }
        for target in gone {
            warn!("{:?} lost track of target {:?}", entity, target);
            perception.forget_target(target);
        }
    }
}

pub fn clear_contacts_system(mut query: Query<&mut Perception>) {
    for mut perception in query.iter_mut() {
        if !perception.contacts.is_empty() {
            perception.clear_contacts();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_follow_bodies() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 0.5,
            ..Default::default()
        });
        let player = world
            .spawn((
                Perception::new(Vec2::new(10.0, 0.0)),
                RigidBody::with_velocity(Vec2::new(-4.0, 2.0)),
                BoxCollider::new(4.0, 2.0),
            ))
            .id();
        let mut watcher = Perception::new(Vec2::ZERO);
        watcher.set_target(player, Vec2::ZERO, Vec2::ZERO);
        let agent = world.spawn(watcher).id();

        let mut schedule = Schedule::default();
        schedule.add_systems((movement_system, refresh_targets_system).chain());
        schedule.run(&mut world);

        let perception = world.get::<Perception>(agent).unwrap();
        let info = perception.target(player).unwrap();
        assert_eq!(info.position, Vec2::new(8.0, 1.0));
        assert_eq!(info.half_extents, Vec2::new(2.0, 1.0));

        world.despawn(player);
        schedule.run(&mut world);
        assert!(world.get::<Perception>(agent).unwrap().target(player).is_none());
    }
}
