//! Named entities that agent definitions can refer to.
//!
//! Definitions never look entities up in the world by name at runtime.
//! Instead, whoever spawns the scene registers the relevant entities here
//! (`"player"`, `"spikes"`, ...) and
//! [`AgentDefinition::build`](crate::resources::agentstore::AgentDefinition::build)
//! resolves symbolic names once, at build time.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::BehaviorError;

/// Name that always resolves to the agent being built.
pub const SELF_TARGET: &str = "self";

#[derive(Resource, Debug, Clone, Default)]
pub struct TargetRegistry {
    pub map: FxHashMap<String, Entity>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, entity: Entity) {
        self.map.insert(name.into(), entity);
    }

    pub fn unregister(&mut self, name: &str) -> Option<Entity> {
        self.map.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Entity> {
        self.map.get(name).copied()
    }

    /// Resolve `name` for the agent `owner`. `"self"` is the owner itself.
    pub fn resolve(&self, name: &str, owner: Entity) -> Result<Entity, BehaviorError> {
        if name == SELF_TARGET {
            return Ok(owner);
        }
        self.get(name)
            .ok_or_else(|| BehaviorError::Definition(format!("unknown target '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_registered_and_self() {
        let mut world = World::new();
        let agent = world.spawn_empty().id();
        let player = world.spawn_empty().id();
        let mut registry = TargetRegistry::new();
        registry.register("player", player);

        assert_eq!(registry.resolve("player", agent).unwrap(), player);
        assert_eq!(registry.resolve(SELF_TARGET, agent).unwrap(), agent);
        assert!(matches!(
            registry.resolve("ghost", agent),
            Err(BehaviorError::Definition(_))
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut registry = TargetRegistry::new();
        registry.register("player", a);
        registry.register("player", b);
        assert_eq!(registry.get("player"), Some(b));
        assert_eq!(registry.unregister("player"), Some(b));
        assert_eq!(registry.get("player"), None);
    }
}
