//! Simulation configuration resource.
//!
//! Settings for a headless behavior run, loaded from an INI file. Defaults
//! are safe to start with; any key missing from the file keeps its default.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fixed_delta = 0.016666668
//! time_scale = 1.0
//! frames = 600
//!
//! [agents]
//! definitions = ./assets/agents.json
//! agent = slime
//!
//! [debug]
//! debug_state = false
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::BehaviorError;

const DEFAULT_FIXED_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_FRAMES: u32 = 600;
const DEFAULT_DEFINITIONS: &str = "./assets/agents.json";
const DEFAULT_AGENT: &str = "slime";
const DEFAULT_DEBUG_STATE: bool = false;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    /// Seconds advanced per simulated frame.
    pub fixed_delta: f32,
    pub time_scale: f32,
    /// Frames to run before stopping.
    pub frames: u32,
    /// JSON file with agent definitions.
    pub definitions: PathBuf,
    /// Name of the definition to spawn.
    pub agent: String,
    /// Turn on debug logging of states, sensors and actuators.
    pub debug_state: bool,
    pub config_path: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self {
            fixed_delta: DEFAULT_FIXED_DELTA,
            time_scale: DEFAULT_TIME_SCALE,
            frames: DEFAULT_FRAMES,
            definitions: PathBuf::from(DEFAULT_DEFINITIONS),
            agent: DEFAULT_AGENT.to_string(),
            debug_state: DEFAULT_DEBUG_STATE,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file at `config_path`.
    pub fn load_from_file(&mut self) -> Result<(), BehaviorError> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| BehaviorError::Config(format!("failed to load config file: {}", e)))?;
        self.apply(&config);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), BehaviorError> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| BehaviorError::Config(format!("failed to parse config: {}", e)))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [simulation] section
        if let Some(dt) = config.getfloat("simulation", "fixed_delta").ok().flatten() {
            if dt > 0.0 {
                self.fixed_delta = dt as f32;
            }
        }
        if let Some(scale) = config.getfloat("simulation", "time_scale").ok().flatten() {
            self.time_scale = (scale as f32).max(0.0);
        }
        if let Some(frames) = config.getuint("simulation", "frames").ok().flatten() {
            self.frames = frames as u32;
        }

        // [agents] section
        if let Some(path) = config.get("agents", "definitions") {
            self.definitions = PathBuf::from(path);
        }
        if let Some(agent) = config.get("agents", "agent") {
            self.agent = agent;
        }

        // [debug] section
        if let Some(debug) = config.getbool("debug", "debug_state").ok().flatten() {
            self.debug_state = debug;
        }

        info!(
            "Loaded config: dt={}, time_scale={}, frames={}, agent='{}' from {:?}, debug={}",
            self.fixed_delta,
            self.time_scale,
            self.frames,
            self.agent,
            self.definitions,
            self.debug_state
        );
    }

    /// Save configuration to the INI file at `config_path`.
    pub fn save_to_file(&self) -> Result<(), BehaviorError> {
        let mut config = Ini::new();

        config.set("simulation", "fixed_delta", Some(self.fixed_delta.to_string()));
        config.set("simulation", "time_scale", Some(self.time_scale.to_string()));
        config.set("simulation", "frames", Some(self.frames.to_string()));

        config.set(
            "agents",
            "definitions",
            Some(self.definitions.to_string_lossy().into_owned()),
        );
        config.set("agents", "agent", Some(self.agent.clone()));

        config.set("debug", "debug_state", Some(self.debug_state.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| BehaviorError::Config(format!("failed to save config file: {}", e)))?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }
}
