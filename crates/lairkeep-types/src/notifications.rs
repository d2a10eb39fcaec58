//! Immutable notification records published on the notification channel.
//!
//! Consumers (UI, persistence, analytics) receive these by value and never
//! reach into the economy or the state machine directly. Each variant maps to
//! one [`NotificationKind`], which is the key subscribers register under.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{GameState, ResourceKind, TimePeriod};
use crate::ids::EventId;

/// A single change announced by the game loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A resource quantity changed.
    ResourceChanged {
        /// The resource that changed.
        kind: ResourceKind,
        /// Quantity after the change.
        new_value: u32,
        /// Quantity before the change.
        old_value: u32,
    },

    /// The gatherer assignment for one resource changed.
    AssignmentChanged {
        /// The resource whose assignment changed.
        kind: ResourceKind,
        /// Gatherers now assigned to it.
        new_count: u32,
    },

    /// The number of unassigned gatherers changed.
    WorkersAvailableChanged {
        /// Unassigned gatherers.
        available: u32,
        /// Total gatherers owned by the lair.
        total_capacity: u32,
    },

    /// Every assignment was returned to the pool in one batch.
    AssignmentsReset {
        /// Unassigned gatherers after the reset.
        available: u32,
        /// Total gatherers owned by the lair.
        total_capacity: u32,
    },

    /// The gathering efficiency multiplier changed.
    EfficiencyChanged {
        /// The multiplier now applied to every gatherable resource.
        multiplier: Decimal,
    },

    /// Aggregate snapshot of every resource quantity.
    AllResourcesUpdated {
        /// Quantity per resource kind.
        snapshot: BTreeMap<ResourceKind, u32>,
    },

    /// The time period changed.
    TimePeriodChanged {
        /// The period now current.
        new: TimePeriod,
        /// The period before the change, if any.
        previous: Option<TimePeriod>,
    },

    /// The turn number changed.
    TurnChanged {
        /// The turn now current.
        new: u32,
        /// The turn before the change, if any.
        previous: Option<u32>,
    },

    /// The state machine entered a new state.
    StateChanged {
        /// The state now current.
        new: GameState,
        /// The state before the change, if any.
        previous: Option<GameState>,
    },

    /// A narrative event became active.
    EventStarted {
        /// Identifier of the event.
        id: EventId,
        /// Title of the event.
        title: String,
    },

    /// The active narrative event was resolved.
    EventCompleted {
        /// Identifier of the event.
        id: EventId,
        /// Index of the choice that was taken.
        choice_index: usize,
    },

    /// A raid interrupted time advancement.
    RaidTriggered {
        /// Strength of the raiding party.
        strength: u32,
        /// Who is raiding.
        source: String,
    },
}

impl Notification {
    /// Return the subscription key for this notification.
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::ResourceChanged { .. } => NotificationKind::ResourceChanged,
            Self::AssignmentChanged { .. } => NotificationKind::AssignmentChanged,
            Self::WorkersAvailableChanged { .. } => NotificationKind::WorkersAvailableChanged,
            Self::AssignmentsReset { .. } => NotificationKind::AssignmentsReset,
            Self::EfficiencyChanged { .. } => NotificationKind::EfficiencyChanged,
            Self::AllResourcesUpdated { .. } => NotificationKind::AllResourcesUpdated,
            Self::TimePeriodChanged { .. } => NotificationKind::TimePeriodChanged,
            Self::TurnChanged { .. } => NotificationKind::TurnChanged,
            Self::StateChanged { .. } => NotificationKind::StateChanged,
            Self::EventStarted { .. } => NotificationKind::EventStarted,
            Self::EventCompleted { .. } => NotificationKind::EventCompleted,
            Self::RaidTriggered { .. } => NotificationKind::RaidTriggered,
        }
    }
}

/// Discriminant of [`Notification`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// See [`Notification::ResourceChanged`].
    ResourceChanged,
    /// See [`Notification::AssignmentChanged`].
    AssignmentChanged,
    /// See [`Notification::WorkersAvailableChanged`].
    WorkersAvailableChanged,
    /// See [`Notification::AssignmentsReset`].
    AssignmentsReset,
    /// See [`Notification::EfficiencyChanged`].
    EfficiencyChanged,
    /// See [`Notification::AllResourcesUpdated`].
    AllResourcesUpdated,
    /// See [`Notification::TimePeriodChanged`].
    TimePeriodChanged,
    /// See [`Notification::TurnChanged`].
    TurnChanged,
    /// See [`Notification::StateChanged`].
    StateChanged,
    /// See [`Notification::EventStarted`].
    EventStarted,
    /// See [`Notification::EventCompleted`].
    EventCompleted,
    /// See [`Notification::RaidTriggered`].
    RaidTriggered,
}
