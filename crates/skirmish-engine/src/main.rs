//! Skirmish engine binary.
//!
//! Wires the configured battlefield to the AI commanders and runs the
//! fixed-step simulation loop until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `skirmish-config.yaml` in the working directory
//! 2. Initialize structured logging (tracing)
//! 3. Read the `scenario` section and build the battlefield
//! 4. Create one commander per team
//! 5. Run the simulation loop
//! 6. Log the result and print it as JSON on stdout

mod error;
mod progress;
mod scenario;

use std::path::{Path, PathBuf};

use skirmish_core::config::SimulationConfig;
use skirmish_core::runner;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;
use crate::scenario::ScenarioConfig;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "skirmish-config.yaml";

/// Ticks between status lines.
const REPORT_EVERY_TICKS: u64 = 100;

/// Application entry point for the skirmish engine.
///
/// # Errors
///
/// Returns an error if configuration, scenario setup, or the run fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    // 1. Load configuration.
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        path = %config_path.display(),
        seed = config.world.seed,
        tick_seconds = config.world.tick_seconds,
        max_ticks = config.world.max_ticks,
        "skirmish-engine starting"
    );

    // 3-4. Build the battlefield and its commanders.
    let scenario_config = load_scenario_config(&config_path)?;
    info!(teams = scenario_config.teams.len(), "Scenario configuration loaded");
    let (mut sim, mut commanders) = scenario::build_scenario(&config, &scenario_config)?;

    // 5. Run.
    let mut callback = ProgressCallback::new(REPORT_EVERY_TICKS);
    let result = runner::run_simulation(
        &mut sim,
        &mut commanders,
        config.world.tick_seconds,
        config.world.max_ticks,
        &mut callback,
    )
    .map_err(EngineError::from)?;

    // 6. Report.
    let json = serde_json::to_string_pretty(&result).map_err(EngineError::from)?;
    println!("{json}");
    info!(
        total_ticks = result.total_ticks,
        active_agents = sim.active_agent_count(),
        "skirmish-engine shutdown complete"
    );
    Ok(())
}

/// Load the simulation configuration, falling back to defaults when the
/// file does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok(config)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Load the `scenario` section from the configuration file.
///
/// A missing file or a file without the section yields the default
/// two-team layout.
fn load_scenario_config(path: &Path) -> Result<ScenarioConfig, EngineError> {
    if !path.exists() {
        info!("Config file not found, using default scenario");
        return Ok(ScenarioConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Scenario {
        message: format!("failed to read config file: {e}"),
    })?;
    scenario::parse_scenario(&contents)
}
