//! Aberred Behavior library.
//!
//! This module exposes the behavior engine's ECS components, resources,
//! systems, and events for use in integration tests and as a reusable
//! library.

pub mod components;
pub mod error;
pub mod events;
pub mod resources;
pub mod simulation;
pub mod systems;
