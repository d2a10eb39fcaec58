//! Session binary for Lairkeep.
//!
//! This is the main entry point that wires together configuration, event
//! content, the simulation, and the autopilot. It loads configuration,
//! initializes logging, plays the configured number of turns, and logs a
//! summary of the session.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `LAIRKEEP_CONFIG` or `lairkeep-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the event catalog from `content.events_path`
//! 4. Build the simulation and attach a notification recorder
//! 5. Start the session and run the autopilot for `simulation.max_turns`
//! 6. Log the result

mod autopilot;
mod error;

use std::path::{Path, PathBuf};

use lairkeep_core::config::{LoggingConfig, SimulationConfig};
use lairkeep_core::content::EventCatalog;
use lairkeep_core::simulation::Simulation;
use lairkeep_economy::AuditResult;
use lairkeep_events::NotificationRecorder;
use lairkeep_types::NotificationKind;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::autopilot::{Autopilot, AutopilotConfig};
use crate::error::EngineError;

/// Environment variable that overrides the config file location.
const CONFIG_ENV: &str = "LAIRKEEP_CONFIG";

/// Config file used when `LAIRKEEP_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "lairkeep-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the session itself fails.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = load_config(&config_path)?;
    let autopilot_config = load_autopilot_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        path = %config_path.display(),
        event_chance = config.turn.event_chance,
        raid_interval = config.raid.interval,
        "Configuration loaded"
    );

    // 3. Load event content.
    let catalog = load_catalog(&config.content.events_path)?;
    info!(events = catalog.len(), "Event catalog loaded");

    // 4. Build the simulation.
    let mut sim = Simulation::new(&config, catalog);
    let (recorder, _) = NotificationRecorder::attach(sim.channel());

    // 5. Play.
    sim.start()?;
    let mut pilot = Autopilot::new(autopilot_config);
    let report = pilot.run(&mut sim, config.simulation.max_turns)?;

    // 6. Log results.
    let stockpile = sim.economy().ledger().snapshot();
    info!(
        turns = report.turns_played,
        final_turn = sim.turn(),
        raids = recorder.count(NotificationKind::RaidTriggered),
        events = recorder.count(NotificationKind::EventStarted),
        buildings = report.buildings,
        hires = report.hires,
        gatherers = sim.economy().allocator().total_capacity(),
        notifications = recorder.len(),
        "Session complete"
    );
    for (kind, quantity) in &stockpile {
        info!(resource = %kind, quantity, "Final stockpile");
    }
    for (kind, count) in sim.economy().ledger().all_gatherers() {
        info!(resource = %kind, gatherers = count, "Final staffing");
    }
    if let AuditResult::Anomaly(anomaly) = sim.audit() {
        error!("{anomaly}");
    }

    info!("lairkeep-engine shutdown complete");
    Ok(())
}

/// Resolve the config file path from the environment.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    }
}

/// Load the main configuration.
///
/// A missing file yields the defaults.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok(config)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Load the `autopilot` section of the config file.
fn load_autopilot_config(path: &Path) -> Result<AutopilotConfig, EngineError> {
    if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Autopilot {
            message: format!("failed to read config file: {e}"),
        })?;
        AutopilotConfig::from_config_yaml(&contents)
    } else {
        Ok(AutopilotConfig::default())
    }
}

/// Load the event catalog. A missing file yields an empty catalog.
fn load_catalog(path: &Path) -> Result<EventCatalog, EngineError> {
    if path.exists() {
        Ok(EventCatalog::from_file(path)?)
    } else {
        warn!(path = %path.display(), "Event content not found, running without events");
        Ok(EventCatalog::default())
    }
}
