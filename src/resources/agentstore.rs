//! Data-driven agent definitions.
//!
//! Agents are described in a JSON file mapping a definition name to an
//! [`AgentDefinition`]: the sensors it owns, its behavior states with their
//! actuators and transitions, and the optional damage, life and animation
//! components. Entities are referred to by symbolic names that are resolved
//! through the [`TargetRegistry`] when the definition is built.
//!
//! ```json
//! {
//!   "slime": {
//!     "sensors": [
//!       { "name": "player_near",
//!         "detector": { "type": "distance", "target": "player", "distance": 64.0 } }
//!     ],
//!     "states": [
//!       { "name": "patrol",
//!         "actuators": [ { "movement": { "horizontal": "left" },
//!                          "speed": { "type": "constant", "speed": 20.0 },
//!                          "reaction": "bounce" } ],
//!         "transitions": [ { "sensor": "player_near", "target": "chase" } ] },
//!       { "name": "chase", "emitters": ["self"] }
//!     ],
//!     "life": { "initial": 10.0 },
//!     "damage_sensor": { "active_from_start": true },
//!     "emitter": { "damage_type": "persistent", "amount": 1.0 }
//!   }
//! }
//! ```

use bevy_ecs::prelude::*;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::components::actuator::Actuator;
use crate::components::animator::Animator;
use crate::components::behaviormachine::BehaviorMachine;
use crate::components::behaviorstate::{BehaviorState, StateId};
use crate::components::damageemitter::{DamageEmitter, DamageType};
use crate::components::damagesensor::DamageSensor;
use crate::components::easing::Easing;
use crate::components::life::Life;
use crate::components::movement::{
    CollisionReaction, HorizontalActuator, HorizontalDirection, SpeedRamp, VerticalActuator,
    VerticalDirection,
};
use crate::components::perception::{Axis, LayerMask};
use crate::components::rigidbody::RigidBody;
use crate::components::sensor::{
    AreaDetector, CollisionDetector, Condition, Detector, DistanceDetector, DistanceMode, Sensor,
    SensorId, TimerDetector,
};
use crate::error::BehaviorError;
use crate::resources::targets::TargetRegistry;

fn default_distance_mode() -> DistanceMode {
    DistanceMode::Magnitude
}

fn default_cooldown() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorDef {
    Distance {
        #[serde(default)]
        target: Option<String>,
        #[serde(default = "default_distance_mode")]
        mode: DistanceMode,
        distance: f32,
        #[serde(default)]
        condition: Condition,
    },
    Area {
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        condition: Condition,
    },
    Collision {
        #[serde(default)]
        layers: LayerMask,
        #[serde(default)]
        axis: Option<Axis>,
    },
    Timer {
        interval: f32,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensorDef {
    pub name: String,
    #[serde(default)]
    pub warmup: f32,
    pub detector: DetectorDef,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeedDef {
    Constant {
        speed: f32,
    },
    Accelerated {
        goal_speed: f32,
        interpolation_time: f32,
        #[serde(default)]
        easing: Easing,
    },
}

impl SpeedDef {
    fn ramp(self) -> SpeedRamp {
        match self {
            SpeedDef::Constant { speed } => SpeedRamp::constant(speed),
            SpeedDef::Accelerated {
                goal_speed,
                interpolation_time,
                easing,
            } => SpeedRamp::accelerated(goal_speed, interpolation_time, easing),
        }
    }
}

/// Axis driven by a movement actuator, with its initial direction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MovementDef {
    Horizontal(HorizontalDirection),
    Vertical(VerticalDirection),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActuatorDef {
    pub movement: MovementDef,
    pub speed: SpeedDef,
    #[serde(default)]
    pub throw: bool,
    #[serde(default)]
    pub follow: Option<String>,
    #[serde(default)]
    pub reaction: CollisionReaction,
    #[serde(default)]
    pub layers: LayerMask,
    /// Sensors the actuator relies on while its state is active.
    #[serde(default)]
    pub sensors: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransitionDef {
    pub sensor: String,
    pub target: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StateDef {
    pub name: String,
    #[serde(default)]
    pub actuators: Vec<ActuatorDef>,
    #[serde(default)]
    pub sensors: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
    /// Emitters switched on while the state is active.
    #[serde(default)]
    pub emitters: Vec<String>,
    #[serde(default)]
    pub damage_sensing: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EmitterDef {
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default)]
    pub amount: f32,
    #[serde(default)]
    pub insta_kill: bool,
    #[serde(default = "default_cooldown")]
    pub cooldown: f32,
    #[serde(default)]
    pub residual_amount: f32,
    #[serde(default)]
    pub residual_applications: u32,
    #[serde(default)]
    pub destroy_after_damage: bool,
    #[serde(default)]
    pub active_from_start: bool,
}

impl EmitterDef {
    pub fn to_emitter(&self) -> DamageEmitter {
        let mut emitter = match self.damage_type {
            DamageType::Instant => DamageEmitter::instant(self.amount),
            DamageType::Persistent => DamageEmitter::persistent(self.amount, self.cooldown),
            DamageType::Residual => DamageEmitter::residual(
                self.amount,
                self.residual_amount,
                self.residual_applications,
                self.cooldown,
            ),
        };
        emitter.insta_kill = self.insta_kill;
        emitter.destroy_after_damage = self.destroy_after_damage;
        emitter.emitting = self.active_from_start;
        emitter
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LifeDef {
    pub initial: f32,
    /// Defaults to `initial`.
    #[serde(default)]
    pub max: Option<f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageSensorDef {
    #[serde(default)]
    pub warmup: f32,
    #[serde(default)]
    pub active_from_start: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AnimatorDef {
    #[serde(default)]
    pub die_duration: f32,
    #[serde(default = "default_true")]
    pub can_flip_x: bool,
    #[serde(default = "default_true")]
    pub can_flip_y: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AgentDefinition {
    #[serde(default)]
    pub sensors: Vec<SensorDef>,
    #[serde(default)]
    pub states: Vec<StateDef>,
    /// Defaults to the first state.
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub life: Option<LifeDef>,
    #[serde(default)]
    pub damage_sensor: Option<DamageSensorDef>,
    /// Emitter carried by the agent itself.
    #[serde(default)]
    pub emitter: Option<EmitterDef>,
    #[serde(default)]
    pub animator: Option<AnimatorDef>,
    #[serde(default)]
    pub max_speed: Option<f32>,
    #[serde(default)]
    pub debug: bool,
}

/// Components produced by [`AgentDefinition::build`], ready to insert.
#[derive(Debug)]
pub struct AgentParts {
    pub machine: BehaviorMachine,
    pub body: RigidBody,
    pub life: Option<Life>,
    pub damage_sensor: Option<DamageSensor>,
    pub emitter: Option<DamageEmitter>,
    pub animator: Option<Animator>,
    /// Entities the agent needs to perceive.
    pub targets: Vec<Entity>,
}

fn unknown(what: &str, name: &str, agent: &str) -> BehaviorError {
    BehaviorError::Definition(format!("agent '{}': unknown {} '{}'", agent, what, name))
}

impl AgentDefinition {
    /// Build the components of `agent`, resolving every symbolic name.
    ///
    /// `name` is only used in error messages.
    pub fn build(
        &self,
        name: &str,
        agent: Entity,
        targets: &TargetRegistry,
    ) -> Result<AgentParts, BehaviorError> {
        if self.states.is_empty() {
            return Err(BehaviorError::Definition(format!(
                "agent '{}' has no states",
                name
            )));
        }

        let mut machine = BehaviorMachine::new();
        let mut perceived: Vec<Entity> = Vec::new();
        let mut perceive = |entity: Entity| {
            if entity != agent && !perceived.contains(&entity) {
                perceived.push(entity);
            }
        };

        let mut sensor_ids: FxHashMap<&str, SensorId> = FxHashMap::default();
        for def in &self.sensors {
            let detector = match &def.detector {
                DetectorDef::Distance {
                    target,
                    mode,
                    distance,
                    condition,
                } => {
                    let target = match target {
                        Some(t) => Some(targets.resolve(t, agent)?),
                        None => None,
                    };
                    target.into_iter().for_each(&mut perceive);
                    Detector::Distance(
                        DistanceDetector::new(target, *mode, *distance).with_condition(*condition),
                    )
                }
                DetectorDef::Area { target, condition } => {
                    let target = match target {
                        Some(t) => Some(targets.resolve(t, agent)?),
                        None => None,
                    };
                    Detector::Area(AreaDetector {
                        target,
                        condition: *condition,
                    })
                }
                DetectorDef::Collision { layers, axis } => Detector::Collision(CollisionDetector {
                    layers: *layers,
                    axis: *axis,
                }),
                DetectorDef::Timer { interval } => Detector::Timer(TimerDetector::new(*interval)),
            };
            let id = machine.add_sensor(Sensor::new(def.name.clone(), detector).with_warmup(def.warmup));
            if sensor_ids.insert(def.name.as_str(), id).is_some() {
                return Err(BehaviorError::Definition(format!(
                    "agent '{}': duplicate sensor '{}'",
                    name, def.name
                )));
            }
        }

        let mut state_ids: FxHashMap<&str, StateId> = FxHashMap::default();
        for (index, def) in self.states.iter().enumerate() {
            if state_ids.insert(def.name.as_str(), StateId(index)).is_some() {
                return Err(BehaviorError::Definition(format!(
                    "agent '{}': duplicate state '{}'",
                    name, def.name
                )));
            }
        }
        let sensor = |n: &str| sensor_ids.get(n).copied().ok_or_else(|| unknown("sensor", n, name));

        for def in &self.states {
            let mut state = BehaviorState::new(def.name.clone());
            for actuator in &def.actuators {
                let sensors = actuator
                    .sensors
                    .iter()
                    .map(|s| sensor(s.as_str()))
                    .collect::<Result<Vec<_>, _>>()?;
                let follow = match &actuator.follow {
                    Some(t) => Some(targets.resolve(t, agent)?),
                    None => None,
                };
                follow.into_iter().for_each(&mut perceive);
                let ramp = actuator.speed.ramp();
                let mut boxed: Box<dyn Actuator> = match actuator.movement {
                    MovementDef::Horizontal(direction) => {
                        let mut a = HorizontalActuator::new(ramp, direction)
                            .with_reaction(actuator.reaction, actuator.layers)
                            .with_sensors(sensors);
                        if actuator.throw {
                            a = a.with_throw();
                        }
                        a.set_follow(follow);
                        Box::new(a)
                    }
                    MovementDef::Vertical(direction) => {
                        let mut a = VerticalActuator::new(ramp, direction)
                            .with_reaction(actuator.reaction, actuator.layers)
                            .with_sensors(sensors);
                        if actuator.throw {
                            a = a.with_throw();
                        }
                        a.set_follow(follow);
                        Box::new(a)
                    }
                };
                if self.debug {
                    boxed.set_debug(true);
                }
                state.add_actuator(boxed);
            }
            for s in &def.sensors {
                state.add_sensor(sensor(s.as_str())?);
            }
            for edge in &def.transitions {
                let target = state_ids
                    .get(edge.target.as_str())
                    .copied()
                    .ok_or_else(|| unknown("state", &edge.target, name))?;
                state.add_transition(sensor(edge.sensor.as_str())?, target);
            }
            for emitter in &def.emitters {
                state.add_emitter(targets.resolve(emitter, agent)?);
            }
            state.set_damage_sensing(def.damage_sensing);
            machine.add_state(state);
        }

        if let Some(initial) = &self.initial {
            let id = state_ids
                .get(initial.as_str())
                .copied()
                .ok_or_else(|| unknown("state", initial, name))?;
            machine.set_initial(id);
        }
        machine.set_debug(self.debug);

        let mut body = RigidBody::new();
        if let Some(max) = self.max_speed {
            body = body.with_max_speed(max);
        }

        let damage_sensor = self.damage_sensor.map(|def| {
            let mut sensor = DamageSensor::new(def.warmup);
            if def.active_from_start {
                sensor = sensor.active_from_start();
            }
            sensor.set_debug(self.debug);
            sensor
        });
        if self.life.is_some() && damage_sensor.is_none() {
            warn!("Agent '{}' has life but no damage sensor: it cannot be hurt", name);
        }

        Ok(AgentParts {
            machine,
            body,
            life: self
                .life
                .map(|l| Life::new(l.initial, l.max.unwrap_or(l.initial))),
            damage_sensor,
            emitter: self.emitter.map(|e| e.to_emitter()),
            animator: self
                .animator
                .map(|a| Animator::new(a.die_duration).with_flips(a.can_flip_x, a.can_flip_y)),
            targets: perceived,
        })
    }
}

/// Every agent definition loaded from disk, by name.
#[derive(Resource, Debug, Clone, Default)]
pub struct AgentStore {
    pub map: FxHashMap<String, AgentDefinition>,
}

impl AgentStore {
    pub fn from_json_str(json: &str) -> Result<Self, BehaviorError> {
        let map: FxHashMap<String, AgentDefinition> = serde_json::from_str(json)?;
        Ok(Self { map })
    }

    /// Loads agent definitions from a JSON file at the specified path.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, BehaviorError> {
        let file_content = std::fs::read_to_string(path.as_ref())?;
        let store = Self::from_json_str(&file_content)?;
        info!(
            "Loaded {} agent definition(s) from {:?}",
            store.map.len(),
            path.as_ref()
        );
        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.map.get(name)
    }
}
