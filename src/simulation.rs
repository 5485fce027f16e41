//! Headless world driver.
//!
//! [`Simulation`] owns the ECS [`World`] and the per-frame [`Schedule`]. Each
//! [`step`](Simulation::step) advances [`WorldTime`] and runs, in order:
//!
//! 1. animation message upkeep and spawn-time wiring (damage sensors, life)
//! 2. physics stand-in: movement, target refresh, contact detection
//! 3. [`behavior_system`]
//! 4. damage pipeline: contact ends, life ticks, new damage contacts, life
//!    effects
//! 5. animation: apply commands, run death clips
//! 6. [`clear_contacts_system`]
//!
//! Contact events triggered from outside between steps (tests, a real
//! physics engine) land in [`Perception`] immediately and are seen by the
//! next step.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::info;

use crate::components::boxcollider::BoxCollider;
use crate::components::perception::Perception;
use crate::components::rigidbody::RigidBody;
use crate::error::BehaviorError;
use crate::events::animation::AnimationCmd;
use crate::events::behavior::{observe_death_event, observe_state_change_event};
use crate::events::collision::observe_contact_event;
use crate::resources::agentstore::AgentDefinition;
use crate::resources::contactpairs::ContactPairs;
use crate::resources::simconfig::SimConfig;
use crate::resources::targets::TargetRegistry;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::{animator_death_system, apply_animation_cmds, update_animation_cmds};
use crate::systems::behavior::behavior_system;
use crate::systems::collision::contact_detection_system;
use crate::systems::damage::{
    attach_life_system, damage_sensor_system, end_damage_contacts_system, life_effects_system,
    life_tick_system, start_damage_sensors,
};
use crate::systems::perception::{clear_contacts_system, movement_system, refresh_targets_system};
use crate::systems::time::update_world_time;

/// The per-frame schedule, in execution order.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            update_animation_cmds,
            start_damage_sensors,
            attach_life_system,
            movement_system,
            refresh_targets_system,
            contact_detection_system,
            behavior_system,
            end_damage_contacts_system,
            life_tick_system,
            damage_sensor_system,
            life_effects_system,
            apply_animation_cmds,
            animator_death_system,
            clear_contacts_system,
        )
            .chain(),
    );
    update
}

pub struct Simulation {
    pub world: World,
    update: Schedule,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(TargetRegistry::default());
        world.insert_resource(ContactPairs::default());
        world.init_resource::<Messages<AnimationCmd>>();
        world.add_observer(observe_contact_event);
        world.add_observer(observe_state_change_event);
        world.add_observer(observe_death_event);
        world.flush();
        Simulation {
            world,
            update: build_schedule(),
        }
    }

    pub fn with_config(config: SimConfig) -> Self {
        let mut sim = Self::new();
        sim.world
            .insert_resource(WorldTime::default().with_time_scale(config.time_scale));
        sim.world.insert_resource(config);
        sim
    }

    /// Advance the world by `dt` unscaled seconds.
    pub fn step(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.update.run(&mut self.world);
        self.world.clear_trackers();
    }

    /// Make `entity` resolvable by name in agent definitions.
    pub fn register_target(&mut self, name: impl Into<String>, entity: Entity) {
        self.world
            .resource_mut::<TargetRegistry>()
            .register(name, entity);
    }

    /// Spawn a physical body that is not an agent (a player, a wall, spikes).
    pub fn spawn_body(&mut self, position: Vec2, velocity: Vec2, collider: BoxCollider) -> Entity {
        self.world
            .spawn((
                Perception::new(position),
                RigidBody::with_velocity(velocity),
                collider,
            ))
            .id()
    }

    /// Build `def` and spawn it as an agent at `position`.
    pub fn spawn_agent(
        &mut self,
        name: &str,
        def: &AgentDefinition,
        position: Vec2,
        collider: Option<BoxCollider>,
    ) -> Result<Entity, BehaviorError> {
        let agent = self.world.spawn_empty().id();
        let parts = match def.build(name, agent, self.world.resource::<TargetRegistry>()) {
            Ok(parts) => parts,
            Err(e) => {
                self.world.despawn(agent);
                return Err(e);
            }
        };

        let mut perception = Perception::new(position);
        for target in &parts.targets {
            perception.set_target(*target, Vec2::ZERO, Vec2::ZERO);
        }

        let mut entity = self.world.entity_mut(agent);
        entity.insert((parts.machine, perception, parts.body));
        if let Some(collider) = collider {
            entity.insert(collider);
        }
        if let Some(sensor) = parts.damage_sensor {
            entity.insert(sensor);
        }
        if let Some(life) = parts.life {
            entity.insert(life);
        }
        if let Some(emitter) = parts.emitter {
            entity.insert(emitter);
        }
        if let Some(animator) = parts.animator {
            entity.insert(animator);
        }
        info!("Spawned agent '{}' as {:?} at {}", name, agent, position);
        Ok(agent)
    }
}
