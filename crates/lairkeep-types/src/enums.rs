//! Enumeration types for the Lairkeep game loop.
//!
//! Resource kinds, the four daily time periods, and the closed set of
//! game states driven by the turn state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// A resource tracked by the lair's ledger.
///
/// `PrimaryCurrency` is special: it is never gathered, has no gatherer slot,
/// has unlimited capacity by default, and accrues only when a turn completes.
/// Every other kind is produced per time period by assigned gatherers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Dungeon points: the lair's spending currency, granted once per turn.
    PrimaryCurrency,
    /// Lumber for construction.
    Wood,
    /// Quarried stone for construction.
    Stone,
    /// Smelted metal for traps and equipment.
    Metal,
    /// Rations that keep minions working.
    Food,
    /// Research points.
    Knowledge,
}

impl ResourceKind {
    /// Every resource kind, in ledger order.
    pub const ALL: [Self; 6] = [
        Self::PrimaryCurrency,
        Self::Wood,
        Self::Stone,
        Self::Metal,
        Self::Food,
        Self::Knowledge,
    ];

    /// The kinds that gatherers can be assigned to (everything except
    /// `PrimaryCurrency`).
    pub const GATHERABLE: [Self; 5] = [
        Self::Wood,
        Self::Stone,
        Self::Metal,
        Self::Food,
        Self::Knowledge,
    ];

    /// Return whether gatherers can be assigned to this kind.
    pub const fn is_gatherable(self) -> bool {
        !matches!(self, Self::PrimaryCurrency)
    }

    /// Human-readable label for logs and summaries.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PrimaryCurrency => "dungeon points",
            Self::Wood => "wood",
            Self::Stone => "stone",
            Self::Metal => "metal",
            Self::Food => "food",
            Self::Knowledge => "knowledge",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Time periods
// ---------------------------------------------------------------------------

/// One of the four ordered sub-phases of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    /// First period of the day; every turn starts here.
    Morning,
    /// Second period.
    Afternoon,
    /// Third period.
    Evening,
    /// Last period; closing it ends the turn.
    Night,
}

impl TimePeriod {
    /// All periods in daily order.
    pub const ALL: [Self; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    /// Return the period that follows this one within the same turn.
    ///
    /// `Night` has no successor: the day ends and the turn rolls over
    /// instead of wrapping back to `Morning`.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Morning => Some(Self::Afternoon),
            Self::Afternoon => Some(Self::Evening),
            Self::Evening => Some(Self::Night),
            Self::Night => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Game states
// ---------------------------------------------------------------------------

/// The state currently held by the turn state machine.
///
/// Exactly one state is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Start-of-turn bookkeeping; moves straight on to action selection.
    TurnStart,
    /// Waiting for the player to pick the next action.
    ActionSelection,
    /// Free action: manage minions and facilities.
    DungeonManagement,
    /// Free action: diplomacy with factions.
    FactionNegotiation,
    /// Free action: plan and pay for construction projects.
    Construction,
    /// Free action: assign gatherers.
    ResourceGathering,
    /// A narrative event is waiting for a choice.
    EventInteraction,
    /// Time is moving forward; events, raids, and period changes are decided.
    AdvanceTime,
    /// A raid is underway and waits for external combat resolution.
    CombatDefense,
    /// End-of-turn accrual and rollover.
    TurnEnd,
}

impl GameState {
    /// Return whether this state is a free action: entered from action
    /// selection and returning to it without consuming time.
    pub const fn is_free_action(self) -> bool {
        matches!(
            self,
            Self::DungeonManagement
                | Self::FactionNegotiation
                | Self::Construction
                | Self::ResourceGathering
        )
    }

    /// Return whether the automatic transition chain pauses in this state
    /// until an external call resolves it.
    pub const fn awaits_input(self) -> bool {
        matches!(
            self,
            Self::ActionSelection | Self::EventInteraction | Self::CombatDefense
        ) || self.is_free_action()
    }
}
