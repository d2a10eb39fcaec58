//! Invariant audit across the ledger and the allocator.
//!
//! Public operations keep these invariants by construction. The audit runs
//! after every command anyway and reports an [`EconomyAnomaly`] when any of
//! them is broken:
//!
//! ```text
//! quantity[k] <= capacity[k]                       for every k
//! available + sum(assigned[k]) == total_capacity
//! ledger.gatherers[k] == allocator.assigned[k]     for every gatherable k
//! ledger.gatherers[PrimaryCurrency] == 0
//! ```

use lairkeep_types::ResourceKind;

use crate::EconomyAnomaly;
use crate::allocator::GathererAllocator;
use crate::ledger::{Capacity, ResourceLedger};

/// The result of an economy audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditResult {
    /// Every invariant holds.
    Sound,
    /// One or more invariants are broken.
    Anomaly(EconomyAnomaly),
}

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A stockpile exceeds its storage limit.
    OverCapacity {
        /// Resource over its limit.
        kind: ResourceKind,
        /// Stored quantity.
        quantity: u32,
        /// Storage limit.
        capacity: Capacity,
    },
    /// Idle plus assigned workers do not add up to the pool size.
    PoolImbalance {
        /// Idle workers.
        available: u32,
        /// Sum of all assignments.
        assigned: u32,
        /// Recorded pool size.
        total_capacity: u32,
    },
    /// The ledger and the allocator disagree about a gatherer count.
    AssignmentMismatch {
        /// Resource in disagreement.
        kind: ResourceKind,
        /// Gatherers the ledger produces with.
        ledger: u32,
        /// Gatherers the allocator believes are assigned.
        allocator: u32,
    },
    /// Gatherers are producing dungeon points.
    CurrencyGatherers {
        /// Gatherers recorded on `PrimaryCurrency`.
        count: u32,
    },
}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OverCapacity {
                kind,
                quantity,
                capacity,
            } => write!(f, "{kind}: {quantity} stored over capacity {capacity}"),
            Self::PoolImbalance {
                available,
                assigned,
                total_capacity,
            } => write!(
                f,
                "pool: {available} idle + {assigned} assigned != {total_capacity} total"
            ),
            Self::AssignmentMismatch {
                kind,
                ledger,
                allocator,
            } => write!(
                f,
                "{kind}: ledger has {ledger} gatherers, allocator has {allocator}"
            ),
            Self::CurrencyGatherers { count } => {
                write!(f, "dungeon points have {count} gatherers")
            }
        }
    }
}

/// Check every economy invariant.
pub fn audit(ledger: &ResourceLedger, allocator: &GathererAllocator) -> AuditResult {
    let mut violations = Vec::new();

    for kind in ResourceKind::ALL {
        let quantity = ledger.get(kind);
        let capacity = ledger.capacity(kind);
        if !capacity.admits(quantity) {
            violations.push(Violation::OverCapacity {
                kind,
                quantity,
                capacity,
            });
        }
    }

    // u64 so a corrupted pool cannot overflow the check itself.
    let available = allocator.available();
    let assigned = ResourceKind::GATHERABLE
        .into_iter()
        .map(|kind| u64::from(allocator.assigned(kind)))
        .fold(0_u64, u64::saturating_add);
    let total_capacity = allocator.total_capacity();
    if u64::from(available).saturating_add(assigned) != u64::from(total_capacity) {
        violations.push(Violation::PoolImbalance {
            available,
            assigned: u32::try_from(assigned).unwrap_or(u32::MAX),
            total_capacity,
        });
    }

    for kind in ResourceKind::GATHERABLE {
        let in_ledger = ledger.gatherers(kind);
        let in_allocator = allocator.assigned(kind);
        if in_ledger != in_allocator {
            violations.push(Violation::AssignmentMismatch {
                kind,
                ledger: in_ledger,
                allocator: in_allocator,
            });
        }
    }

    let currency_gatherers = ledger.gatherers(ResourceKind::PrimaryCurrency);
    if currency_gatherers > 0 {
        violations.push(Violation::CurrencyGatherers {
            count: currency_gatherers,
        });
    }

    if violations.is_empty() {
        return AuditResult::Sound;
    }

    let message = format!(
        "ECONOMY_ANOMALY: {} invariant(s) broken: {}",
        violations.len(),
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    );
    AuditResult::Anomaly(EconomyAnomaly {
        violations,
        message,
    })
}
