//! ECS resources made available to systems.
//!
//! Overview
//! - `agentstore` – agent definitions loaded from JSON
//! - `contactpairs` – overlaps seen on the previous frame
//! - `simconfig` – simulation settings loaded from an INI file
//! - `targets` – named entities that definitions can refer to
//! - `worldtime` – simulation time and delta
pub mod agentstore;
pub mod contactpairs;
pub mod simconfig;
pub mod targets;
pub mod worldtime;
