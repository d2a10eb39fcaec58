//! Configuration loading and typed config structures for a Lairkeep session.
//!
//! The canonical configuration lives in `lairkeep-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file. Every field has a
//! default, so an empty document describes the standard game.

use std::path::{Path, PathBuf};

use lairkeep_economy::{EconomyConfig, GathererConfig};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level session configuration.
///
/// Mirrors the structure of `lairkeep-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Session name and random seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Starting stockpile, storage limits, and production constants.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Worker pool settings.
    #[serde(default)]
    pub gatherers: GathererConfig,

    /// Turn flow settings.
    #[serde(default)]
    pub turn: TurnConfig,

    /// Raid schedule.
    #[serde(default)]
    pub raid: RaidConfig,

    /// Narrative content location.
    #[serde(default)]
    pub content: ContentConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null, not as an empty map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde cannot constrain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.turn.event_chance) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "turn.event_chance must be within 0.0..=1.0, got {}",
                    self.turn.event_chance
                ),
            });
        }
        if self.turn.max_chain_hops == 0 {
            return Err(ConfigError::Invalid {
                reason: "turn.max_chain_hops must be at least 1".to_owned(),
            });
        }
        if self.raid.interval == 0 {
            return Err(ConfigError::Invalid {
                reason: "raid.interval must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Session-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable lair name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducible event and raid rolls.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

/// Turn flow configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TurnConfig {
    /// Probability that entering time advancement draws a narrative event.
    #[serde(default = "default_event_chance")]
    pub event_chance: f64,

    /// Most automatic transitions allowed in one external call before the
    /// machine halts.
    #[serde(default = "default_max_chain_hops")]
    pub max_chain_hops: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            event_chance: default_event_chance(),
            max_chain_hops: default_max_chain_hops(),
        }
    }
}

/// Raid schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RaidConfig {
    /// Raid checks between raids; the check on this count fires.
    #[serde(default = "default_raid_interval")]
    pub interval: u32,

    /// Raid strength before turn scaling.
    #[serde(default = "default_raid_base_strength")]
    pub base_strength: u32,

    /// Strength added per elapsed turn.
    #[serde(default = "default_raid_strength_per_turn")]
    pub strength_per_turn: u32,

    /// Who is attacking.
    #[serde(default = "default_raid_source")]
    pub source: String,
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            interval: default_raid_interval(),
            base_strength: default_raid_base_strength(),
            strength_per_turn: default_raid_strength_per_turn(),
            source: default_raid_source(),
        }
    }
}

/// Narrative content configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentConfig {
    /// Path of the YAML event catalog, relative to the working directory.
    #[serde(default = "default_events_path")]
    pub events_path: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            events_path: default_events_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Session boundary parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Turns the engine plays before ending the session.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_world_name() -> String {
    "Lairkeep".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_event_chance() -> f64 {
    0.2
}

const fn default_max_chain_hops() -> u32 {
    32
}

const fn default_raid_interval() -> u32 {
    5
}

const fn default_raid_base_strength() -> u32 {
    10
}

const fn default_raid_strength_per_turn() -> u32 {
    2
}

fn default_raid_source() -> String {
    "Adventurers' Guild".to_owned()
}

fn default_events_path() -> PathBuf {
    PathBuf::from("content/events.yaml")
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_max_turns() -> u32 {
    10
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lairkeep_types::ResourceKind;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.seed, 42);
        assert!((config.turn.event_chance - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.turn.max_chain_hops, 32);
        assert_eq!(config.raid.interval, 5);
        assert_eq!(config.gatherers.starting_gatherers, 5);
        assert_eq!(config.simulation.max_turns, 10);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SimulationConfig::parse("").unwrap(), SimulationConfig::default());
        assert_eq!(
            SimulationConfig::parse("world:\n  seed: 42\n").unwrap(),
            SimulationConfig::default()
        );
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test Lair"
  seed: 7

economy:
  starting_resources:
    primary_currency: 250
    wood: 10
  capacities:
    wood: 40
  base_yield_per_gatherer: 3
  currency_per_turn: 20

gatherers:
  starting_gatherers: 8
  efficiency: "1.25"

turn:
  event_chance: 0.5
  max_chain_hops: 16

raid:
  interval: 3
  base_strength: 4
  strength_per_turn: 1
  source: "Paladin Order"

content:
  events_path: "data/events.yaml"

logging:
  level: "debug"
  json: true

simulation:
  max_turns: 25
"#;
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Test Lair");
        assert_eq!(config.world.seed, 7);
        assert_eq!(
            config.economy.starting_resources.get(&ResourceKind::PrimaryCurrency),
            Some(&250)
        );
        assert_eq!(config.economy.starting_resources.get(&ResourceKind::Stone), None);
        assert_eq!(config.economy.capacities.get(&ResourceKind::Wood), Some(&40));
        assert_eq!(config.economy.capacities.get(&ResourceKind::Metal), None);
        assert_eq!(config.economy.base_yield_per_gatherer, 3);
        assert_eq!(config.gatherers.starting_gatherers, 8);
        assert_eq!(config.gatherers.efficiency, dec!(1.25));
        assert_eq!(config.turn.max_chain_hops, 16);
        assert_eq!(config.raid.source, "Paladin Order");
        assert_eq!(config.content.events_path, PathBuf::from("data/events.yaml"));
        assert!(config.logging.json);
        assert_eq!(config.simulation.max_turns, 25);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            SimulationConfig::parse("turn:\n  event_chance: 1.5\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            SimulationConfig::parse("raid:\n  interval: 0\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            SimulationConfig::parse("turn:\n  max_chain_hops: 0\n"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            SimulationConfig::parse("world: [unterminated"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
