//! Behavior machine system.
//!
//! [`behavior_system`] ticks every agent's
//! [`BehaviorMachine`] with its [`Perception`] and the velocity of its
//! [`RigidBody`], reports state changes as [`StateChangeEvent`]s and applies
//! the side effects the machine queued:
//!
//! - emitter toggles go to the named [`DamageEmitter`]
//! - damage sensing toggles start or stop the agent's [`DamageSensor`]
//! - animation commands are forwarded to animated entities only
//! - destroy requests play the death clip or despawn
//!
//! Agents playing their death clip are no longer ticked.

use bevy_ecs::prelude::*;
use log::{error, warn};

use crate::components::agentcommand::AgentCommand;
use crate::components::animator::Animator;
use crate::components::behaviormachine::{BehaviorMachine, StateTransition};
use crate::components::damageemitter::DamageEmitter;
use crate::components::damagesensor::DamageSensor;
use crate::components::perception::Perception;
use crate::components::rigidbody::RigidBody;
use crate::events::behavior::StateChangeEvent;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::AnimationDriver;

pub fn behavior_system(
    mut query: Query<(
        Entity,
        &mut BehaviorMachine,
        &Perception,
        &mut RigidBody,
        Option<&Animator>,
    )>,
    mut emitters: Query<&mut DamageEmitter>,
    mut damage_sensors: Query<&mut DamageSensor>,
    mut driver: AnimationDriver,
    time: Res<WorldTime>,
) {
    for (entity, mut machine, perception, mut body, animator) in query.iter_mut() {
        if animator.is_some_and(|a| a.is_dying()) {
            continue;
        }

        match machine.tick(time.delta, entity, perception, &mut body.velocity) {
            Ok(StateTransition::Stay) => {}
            Ok(StateTransition::Entered(to)) => {
                driver.commands.trigger(StateChangeEvent {
                    entity,
                    from: None,
                    to,
                    to_name: machine.current_state_name().unwrap_or_default().to_string(),
                });
            }
            Ok(StateTransition::Switched { from, to }) => {
                driver.commands.trigger(StateChangeEvent {
                    entity,
                    from: Some(from),
                    to,
                    to_name: machine.current_state_name().unwrap_or_default().to_string(),
                });
            }
            Err(e) => error!("{:?}: behavior tick failed: {}", entity, e),
        }
        body.settle();

        for command in machine.drain_commands() {
            match command {
                AgentCommand::SetEmitting { emitter, emitting } => {
                    match emitters.get_mut(emitter) {
                        Ok(mut e) => e.set_emitting(emitting),
                        Err(_) => warn!("{:?}: emitter {:?} not found", entity, emitter),
                    }
                }
                AgentCommand::SetDamageSensing { entity: target, active } => {
                    match damage_sensors.get_mut(target) {
                        Ok(mut sensor) if active => sensor.start(),
                        Ok(mut sensor) => sensor.stop(),
                        Err(_) => warn!("{:?}: no damage sensor to toggle", target),
                    }
                }
                AgentCommand::Animate(cmd) => {
                    driver.send(cmd);
                }
                AgentCommand::Destroy { entity: target } => driver.destroy(target),
            }
        }
    }
}
