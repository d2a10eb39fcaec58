//! Narrative event records supplied by the content feed.
//!
//! The engine never interprets event text. It reads eligibility to decide
//! whether a record may fire in the current time period, and hands the
//! chosen [`Choice`]'s [`ChoiceEffect`] to an effect applier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{ResourceKind, TimePeriod};
use crate::ids::EventId;

/// A narrative event with an ordered list of choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier from the content feed.
    pub id: EventId,
    /// Short title shown to the player.
    pub title: String,
    /// Longer flavor text.
    #[serde(default)]
    pub description: String,
    /// Choices in display order; the player resolves the event by index.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Time periods during which the event may fire.
    #[serde(default)]
    pub occurs_in: PeriodEligibility,
}

impl EventRecord {
    /// Return whether this event may fire during `period`.
    pub const fn can_occur_during(&self, period: TimePeriod) -> bool {
        self.occurs_in.allows(period)
    }

    /// Look up a choice by index.
    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }
}

/// One selectable answer to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Text of the choice.
    pub text: String,
    /// What happens when the choice is taken.
    #[serde(default)]
    pub effect: ChoiceEffect,
}

/// Resource and worker consequences of a [`Choice`].
///
/// Costs are paid all-or-nothing before grants are credited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceEffect {
    /// Narrative summary of the outcome.
    #[serde(default)]
    pub description: String,
    /// Resources credited to the ledger (clamped to capacity).
    #[serde(default)]
    pub grants: BTreeMap<ResourceKind, u32>,
    /// Resources that must be paid to take the choice.
    #[serde(default)]
    pub costs: BTreeMap<ResourceKind, u32>,
    /// New workers joining the gatherer pool.
    #[serde(default)]
    pub workers: u32,
}

impl ChoiceEffect {
    /// Return whether applying this effect changes nothing.
    pub fn is_empty(&self) -> bool {
        self.grants.values().all(|amount| *amount == 0)
            && self.costs.values().all(|amount| *amount == 0)
            && self.workers == 0
    }
}

/// Per-period eligibility flags for an [`EventRecord`].
///
/// Every flag defaults to `true`: an event with no explicit constraints may
/// fire at any time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct PeriodEligibility {
    /// Eligible during the morning.
    #[serde(default = "default_true")]
    pub morning: bool,
    /// Eligible during the afternoon.
    #[serde(default = "default_true")]
    pub afternoon: bool,
    /// Eligible during the evening.
    #[serde(default = "default_true")]
    pub evening: bool,
    /// Eligible during the night.
    #[serde(default = "default_true")]
    pub night: bool,
}

impl PeriodEligibility {
    /// Eligibility for every period.
    pub const ANY_TIME: Self = Self {
        morning: true,
        afternoon: true,
        evening: true,
        night: true,
    };

    /// Eligibility for exactly one period.
    pub const fn only(period: TimePeriod) -> Self {
        Self {
            morning: matches!(period, TimePeriod::Morning),
            afternoon: matches!(period, TimePeriod::Afternoon),
            evening: matches!(period, TimePeriod::Evening),
            night: matches!(period, TimePeriod::Night),
        }
    }

    /// Return the flag for `period`.
    pub const fn allows(self, period: TimePeriod) -> bool {
        match period {
            TimePeriod::Morning => self.morning,
            TimePeriod::Afternoon => self.afternoon,
            TimePeriod::Evening => self.evening,
            TimePeriod::Night => self.night,
        }
    }
}

impl Default for PeriodEligibility {
    fn default() -> Self {
        Self::ANY_TIME
    }
}

const fn default_true() -> bool {
    true
}
