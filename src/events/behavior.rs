//! Notifications about agent behavior.
//!
//! - [`StateChangeEvent`] is triggered by the behavior system whenever an
//!   agent enters its initial state or swaps states.
//! - [`DeathEvent`] is triggered by the life system the first time an
//!   agent's health reaches zero.
//!
//! Both are plain observer events; the engine itself does not observe them.
use bevy_ecs::prelude::*;
use log::info;

use crate::components::behaviorstate::StateId;

#[derive(Event, Debug, Clone, PartialEq)]
pub struct StateChangeEvent {
    pub entity: Entity,
    /// `None` when the initial state was entered.
    pub from: Option<StateId>,
    pub to: StateId,
    pub to_name: String,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathEvent {
    pub entity: Entity,
}

/// Logs every state change. Register it for a trace of agent behavior.
pub fn observe_state_change_event(trigger: On<StateChangeEvent>) {
    let event = trigger.event();
    info!(
        "{:?} now in state '{}' (from {:?})",
        event.entity, event.to_name, event.from
    );
}

/// Logs every death.
pub fn observe_death_event(trigger: On<DeathEvent>) {
    info!("{:?} died", trigger.event().entity);
}
