//! Engine systems.
//!
//! Submodules overview
//! - [`animation`] – animation message upkeep, animator updates, death clips
//! - [`behavior`] – tick behavior machines and apply their side effects
//! - [`collision`] – box overlap checks and contact event emission
//! - [`damage`] – damage sensors, life accrual and its effects
//! - [`perception`] – movement, target refresh and contact cleanup
//! - [`time`] – update simulation time and delta

pub mod animation;
pub mod behavior;
pub mod collision;
pub mod damage;
pub mod perception;
pub mod time;
