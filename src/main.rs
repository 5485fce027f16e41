//! Aberred Behavior main entry point.
//!
//! Runs a headless behavior simulation:
//! - **bevy_ecs** for the entity-component-system architecture
//! - agent definitions in JSON, simulation settings in an INI file
//!
//! The scene is scripted: a player walks from the left towards the agent,
//! past a patch of spikes, while the agent patrols, notices the player and
//! chases it. State changes, damage and deaths are logged.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --agent slime --frames 900
//! ```

use std::path::PathBuf;

use aberredbehavior::components::boxcollider::BoxCollider;
use aberredbehavior::components::damageemitter::DamageEmitter;
use aberredbehavior::components::damagesensor::DamageSensor;
use aberredbehavior::components::behaviormachine::BehaviorMachine;
use aberredbehavior::components::life::Life;
use aberredbehavior::resources::agentstore::AgentStore;
use aberredbehavior::resources::simconfig::SimConfig;
use aberredbehavior::simulation::Simulation;
use clap::Parser;
use glam::Vec2;
use log::{error, info, warn};

const PLAYER_LAYER: u8 = 1;
const SPIKES_LAYER: u8 = 2;
const REPORT_EVERY: u32 = 60;

/// Aberred Behavior
#[derive(Parser)]
#[command(version, about = "Headless behavior engine simulation")]
struct Cli {
    /// INI file with simulation settings.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON file with agent definitions. Overrides the config file.
    #[arg(long, value_name = "PATH")]
    definitions: Option<PathBuf>,

    /// Agent definition to spawn. Overrides the config file.
    #[arg(long)]
    agent: Option<String>,

    /// Number of frames to simulate. Overrides the config file.
    #[arg(long)]
    frames: Option<u32>,

    /// Write the effective configuration back to the config file.
    #[arg(long)]
    save_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = SimConfig::with_path(&cli.config);
    if cli.config.exists() {
        if let Err(e) = config.load_from_file() {
            warn!("{}; using defaults", e);
        }
    } else {
        info!("No config file at {:?}; using defaults", cli.config);
    }
    if let Some(definitions) = cli.definitions {
        config.definitions = definitions;
    }
    if let Some(agent) = cli.agent {
        config.agent = agent;
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if cli.save_config {
        if let Err(e) = config.save_to_file() {
            warn!("{}", e);
        }
    }

    let store = match AgentStore::load_from_file(&config.definitions) {
        Ok(store) => store,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let Some(def) = store.get(&config.agent) else {
        error!(
            "No agent named '{}' in {:?}",
            config.agent, config.definitions
        );
        std::process::exit(1);
    };
    let mut def = def.clone();
    def.debug |= config.debug_state;

    let agent_name = config.agent.clone();
    let frames = config.frames;
    let dt = config.fixed_delta;
    let mut sim = Simulation::with_config(config);

    // --------------- Scene ---------------
    let player = sim.spawn_body(
        Vec2::new(-240.0, 0.0),
        Vec2::new(40.0, 0.0),
        BoxCollider::new(16.0, 16.0).with_layer(PLAYER_LAYER),
    );
    sim.world
        .entity_mut(player)
        .insert((DamageSensor::new(0.0).active_from_start(), Life::new(5.0, 5.0)));
    sim.register_target("player", player);

    let spikes = sim.spawn_body(
        Vec2::new(-96.0, 0.0),
        Vec2::ZERO,
        BoxCollider::new(16.0, 32.0).with_layer(SPIKES_LAYER),
    );
    sim.world
        .entity_mut(spikes)
        .insert(DamageEmitter::residual(2.0, 1.0, 3, 1.0).active_from_start());
    sim.register_target("spikes", spikes);

    let agent = match sim.spawn_agent(
        &agent_name,
        &def,
        Vec2::ZERO,
        Some(BoxCollider::new(16.0, 16.0)),
    ) {
        Ok(agent) => agent,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // --------------- Main loop ---------------
    for frame in 1..=frames {
        sim.step(dt);

        if frame % REPORT_EVERY == 0 {
            report(&sim, agent, "agent");
            report(&sim, player, "player");
        }
        if sim.world.get_entity(agent).is_err() {
            info!("Agent gone after {} frames", frame);
            break;
        }
    }
    info!("Simulation finished");
}

fn report(sim: &Simulation, entity: bevy_ecs::entity::Entity, label: &str) {
    let Ok(entity_ref) = sim.world.get_entity(entity) else {
        return;
    };
    let state = entity_ref
        .get::<BehaviorMachine>()
        .and_then(|m| m.current_state_name())
        .unwrap_or("-");
    let health = entity_ref.get::<Life>().map(|l| l.current());
    info!("{} {:?}: state '{}', health {:?}", label, entity, state, health);
}
