//! Event types and observers used by the engine.
//!
//! Submodules:
//! - [`animation`] – fire-and-forget commands for the animation provider
//! - [`behavior`] – state change and death notifications
//! - [`collision`] – contacts reported by the physics provider
//!
//! See each submodule for concrete event data, semantics, and example usage.
pub mod animation;
pub mod behavior;
pub mod collision;
