//! Resource ledger and worker pool for the Lairkeep game loop.
//!
//! Every resource unit the lair owns is tracked by the [`ResourceLedger`].
//! Quantities never exceed their storage limit, dungeon points are never
//! gathered, and gatherer counts change only through the
//! [`GathererAllocator`], which keeps the worker pool conserved.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`ResourceLedger`]: quantities, capacities, production.
//! - [`allocator`] -- The [`GathererAllocator`] and its [`GathererPool`].
//! - [`economy`] -- [`Economy`], the exclusive owner of both.
//! - [`cost`] -- Multi-resource [`ResourceCost`] lists.
//! - [`conservation`] -- Invariant audit producing [`EconomyAnomaly`].
//! - [`config`] -- Designer defaults.
//!
//! # Invariants
//!
//! ```text
//! quantity[k] <= capacity[k]
//! available + sum(assigned[k]) == total_capacity
//! ```
//!
//! Operations never panic; validation failures return errors and leave the
//! economy unchanged.
//!
//! # Usage
//!
//! ```
//! use lairkeep_economy::{Economy, EconomyConfig, GathererConfig};
//! use lairkeep_events::NotificationChannel;
//! use lairkeep_types::ResourceKind;
//!
//! let channel = NotificationChannel::new();
//! let mut economy = Economy::new(
//!     &EconomyConfig::default(),
//!     &GathererConfig::default(),
//!     &channel,
//! );
//!
//! economy.assign_gatherers(ResourceKind::Wood, 3).ok();
//! let produced = economy.ledger_mut().process_time_advancement();
//! assert_eq!(produced.get(&ResourceKind::Wood), Some(&15));
//! ```

pub mod allocator;
pub mod config;
pub mod conservation;
pub mod cost;
pub mod economy;
pub mod ledger;

// Re-export primary types at crate root.
pub use allocator::{GathererAllocator, GathererPool, MIN_EFFICIENCY};
pub use config::{EconomyConfig, GathererConfig};
pub use conservation::{AuditResult, Violation};
pub use cost::ResourceCost;
pub use economy::Economy;
pub use ledger::{Capacity, ResourceLedger};

use lairkeep_types::ResourceKind;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Amounts must be strictly positive.
    #[error("amount of {kind} must be non-zero")]
    ZeroAmount {
        /// Resource named in the request.
        kind: ResourceKind,
    },

    /// The stockpile is already at its storage limit.
    #[error("{kind} is already at capacity {capacity}")]
    AtCapacity {
        /// Resource that is full.
        kind: ResourceKind,
        /// Its storage limit.
        capacity: Capacity,
    },

    /// Not enough of a resource to pay.
    #[error("insufficient {kind}: requested {requested}, available {available}")]
    Insufficient {
        /// Resource that is short.
        kind: ResourceKind,
        /// Amount required.
        requested: u32,
        /// Amount held.
        available: u32,
    },

    /// Gatherers cannot be assigned to this resource.
    #[error("{kind} cannot be gathered")]
    NotGatherable {
        /// The rejected resource.
        kind: ResourceKind,
    },
}

/// Errors returned by gatherer allocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocatorError {
    /// Dungeon points have no gatherer slot.
    #[error("dungeon points cannot be gathered")]
    CurrencyNotGatherable,

    /// The increase needs more idle workers than the pool has.
    #[error("assigning {kind} needs {requested} more workers, only {available} idle")]
    InsufficientWorkers {
        /// Resource being assigned.
        kind: ResourceKind,
        /// Additional workers needed.
        requested: u32,
        /// Idle workers in the pool.
        available: u32,
    },

    /// The worker count would not fit in the pool.
    #[error("worker pool overflow")]
    PoolOverflow,

    /// The ledger rejected the new gatherer count.
    #[error("ledger rejected assignment: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// One or more economy invariants found broken by an audit.
///
/// This is the `ECONOMY_ANOMALY` alert. It signals a defect in the crate,
/// never a player mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomyAnomaly {
    /// Every broken invariant found.
    pub violations: Vec<Violation>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for EconomyAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
