//! Animation systems.
//!
//! - [`update_animation_cmds`] advances the [`AnimationCmd`] message queue;
//!   it runs first every frame.
//! - [`apply_animation_cmds`] hands each command to the target's
//!   [`Animator`] and pins the body of agents starting their death clip.
//! - [`animator_death_system`] runs death clips to completion and despawns
//!   the entity afterwards.
//!
//! Systems that need to animate or remove an agent go through the
//! [`AnimationDriver`] parameter, which knows whether the entity has an
//! animator to talk to.
//!
//! # Related
//!
//! - [`crate::components::animator::Animator`] – per-entity animation state
//! - [`crate::events::animation::AnimationCmd`] – the commands themselves

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use log::debug;

use crate::components::animator::Animator;
use crate::components::rigidbody::RigidBody;
use crate::events::animation::{AnimationClip, AnimationCmd};
use crate::resources::worldtime::WorldTime;

/// Bundled system parameters for animating and removing agents.
#[derive(SystemParam)]
pub struct AnimationDriver<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub animators: Query<'w, 's, &'static Animator>,
    pub animation_cmds: MessageWriter<'w, AnimationCmd>,
}

impl AnimationDriver<'_, '_> {
    fn is_animated(&self, entity: Entity) -> bool {
        self.animators.get(entity).is_ok_and(|a| a.enabled)
    }

    /// Forward `cmd` if its entity has an enabled animator.
    pub fn send(&mut self, cmd: AnimationCmd) -> bool {
        if !self.is_animated(cmd.entity()) {
            return false;
        }
        self.animation_cmds.write(cmd);
        true
    }

    /// Remove `entity`: play its death clip when animated, despawn it
    /// otherwise.
    pub fn destroy(&mut self, entity: Entity) {
        if self.send(AnimationCmd::Play {
            entity,
            clip: AnimationClip::Die,
        }) {
            debug!("{:?} playing death clip", entity);
        } else {
            debug!("{:?} despawned", entity);
            self.commands.entity(entity).try_despawn();
        }
    }
}

/// Advance the ECS message queue for [`AnimationCmd`].
pub fn update_animation_cmds(mut msgs: ResMut<Messages<AnimationCmd>>) {
    msgs.update();
}

pub fn apply_animation_cmds(
    mut reader: MessageReader<AnimationCmd>,
    mut animators: Query<(&mut Animator, Option<&mut RigidBody>)>,
) {
    for cmd in reader.read() {
        let Ok((mut animator, body)) = animators.get_mut(cmd.entity()) else {
            continue;
        };
        animator.apply(cmd);
        let dying = matches!(
            cmd,
            AnimationCmd::Play {
                clip: AnimationClip::Die,
                ..
            }
        );
        if let (true, Some(mut body)) = (dying, body) {
            body.freeze();
        }
    }
}

pub fn animator_death_system(
    mut query: Query<(Entity, &mut Animator)>,
    time: Res<WorldTime>,
    mut commands: Commands,
) {
    for (entity, mut animator) in query.iter_mut() {
        if animator.tick_death(time.delta) {
            debug!("{:?} death clip finished", entity);
            commands.entity(entity).try_despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 0.25,
            ..Default::default()
        });
        world.init_resource::<Messages<AnimationCmd>>();
        world
    }

    fn destroy(world: &mut World, entity: Entity) {
        let mut state: bevy_ecs::system::SystemState<AnimationDriver> =
            bevy_ecs::system::SystemState::new(world);
        let mut driver = state.get_mut(world);
        driver.destroy(entity);
        state.apply(world);
    }

    #[test]
    fn test_destroy_without_animator_despawns() {
        let mut world = world();
        let e = world.spawn(RigidBody::new()).id();
        destroy(&mut world, e);
        assert!(world.get_entity(e).is_err());
    }

    #[test]
    fn test_destroy_plays_death_clip_then_despawns() {
        let mut world = world();
        let e = world
            .spawn((
                Animator::new(0.5),
                RigidBody::with_velocity(Vec2::new(3.0, 0.0)),
            ))
            .id();
        destroy(&mut world, e);

        let mut schedule = Schedule::default();
        schedule.add_systems((apply_animation_cmds, animator_death_system).chain());

        schedule.run(&mut world);
        assert!(world.get::<Animator>(e).unwrap().is_dying());
        assert!(world.get::<RigidBody>(e).unwrap().frozen);
        assert_eq!(world.get::<RigidBody>(e).unwrap().velocity, Vec2::ZERO);

        schedule.run(&mut world);
        assert!(world.get_entity(e).is_err());
    }

    #[test]
    fn test_disabled_animator_is_skipped() {
        let mut world = world();
        let mut animator = Animator::new(1.0);
        animator.enabled = false;
        let e = world.spawn(animator).id();
        destroy(&mut world, e);
        assert!(world.get_entity(e).is_err());
    }
}
