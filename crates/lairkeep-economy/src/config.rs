//! Designer defaults for the lair economy.
//!
//! These structs mirror the `economy` and `gatherers` sections of
//! `lairkeep-config.yaml`. Every field has a serde default so a partial (or
//! empty) YAML document still yields the standard starting economy.

use std::collections::BTreeMap;

use lairkeep_types::ResourceKind;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Starting stockpile, storage limits, and production constants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Quantity of each resource at session start. Missing kinds start at 0.
    #[serde(default = "default_starting_resources")]
    pub starting_resources: BTreeMap<ResourceKind, u32>,

    /// Storage limit per resource. Missing kinds are unlimited;
    /// `primary_currency` is always unlimited at session start.
    #[serde(default = "default_capacities")]
    pub capacities: BTreeMap<ResourceKind, u32>,

    /// Units produced per assigned gatherer per time period (default: 5).
    #[serde(default = "default_base_yield_per_gatherer")]
    pub base_yield_per_gatherer: u32,

    /// Dungeon points granted when a turn completes (default: 15).
    #[serde(default = "default_currency_per_turn")]
    pub currency_per_turn: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_resources: default_starting_resources(),
            capacities: default_capacities(),
            base_yield_per_gatherer: default_base_yield_per_gatherer(),
            currency_per_turn: default_currency_per_turn(),
        }
    }
}

/// Gatherer pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GathererConfig {
    /// Workers in the pool at session start, all unassigned (default: 5).
    #[serde(default = "default_starting_gatherers")]
    pub starting_gatherers: u32,

    /// Initial gathering efficiency multiplier (default: 1.0).
    #[serde(default = "default_efficiency")]
    pub efficiency: Decimal,
}

impl Default for GathererConfig {
    fn default() -> Self {
        Self {
            starting_gatherers: default_starting_gatherers(),
            efficiency: default_efficiency(),
        }
    }
}

fn default_starting_resources() -> BTreeMap<ResourceKind, u32> {
    BTreeMap::from([
        (ResourceKind::PrimaryCurrency, 100),
        (ResourceKind::Wood, 30),
        (ResourceKind::Stone, 20),
        (ResourceKind::Metal, 10),
        (ResourceKind::Food, 50),
        (ResourceKind::Knowledge, 0),
    ])
}

fn default_capacities() -> BTreeMap<ResourceKind, u32> {
    BTreeMap::from([
        (ResourceKind::Wood, 100),
        (ResourceKind::Stone, 100),
        (ResourceKind::Metal, 50),
        (ResourceKind::Food, 200),
        (ResourceKind::Knowledge, 100),
    ])
}

const fn default_base_yield_per_gatherer() -> u32 {
    5
}

const fn default_currency_per_turn() -> u32 {
    15
}

const fn default_starting_gatherers() -> u32 {
    5
}

const fn default_efficiency() -> Decimal {
    Decimal::ONE
}
