//! Conserved worker pool distributed across gatherable resources.
//!
//! The allocator is the only path that may change the ledger's gatherer
//! counts. Every operation validates completely before touching state, so a
//! rejected request leaves both the pool and the ledger unchanged.
//!
//! Pool invariant: `available + sum(assignments) == total_capacity`.

use std::collections::BTreeMap;

use lairkeep_events::NotificationChannel;
use lairkeep_types::{Notification, ResourceKind};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::GathererConfig;
use crate::ledger::ResourceLedger;
use crate::AllocatorError;

/// Lowest efficiency multiplier the allocator will apply (0.1).
pub const MIN_EFFICIENCY: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Idle and total worker counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GathererPool {
    /// Workers not assigned to any resource.
    pub available: u32,
    /// Every worker the lair owns, assigned or not.
    pub total_capacity: u32,
}

/// Distributes workers from the [`GathererPool`] onto resources.
#[derive(Debug)]
pub struct GathererAllocator {
    pool: GathererPool,
    assignments: BTreeMap<ResourceKind, u32>,
    efficiency: Decimal,
    channel: NotificationChannel,
}

impl GathererAllocator {
    /// Create an allocator with every starting worker idle.
    ///
    /// The configured efficiency is floored to [`MIN_EFFICIENCY`] but not yet
    /// applied to any ledger; see [`Self::sync_efficiency`].
    pub fn new(config: &GathererConfig, channel: NotificationChannel) -> Self {
        Self {
            pool: GathererPool {
                available: config.starting_gatherers,
                total_capacity: config.starting_gatherers,
            },
            assignments: ResourceKind::GATHERABLE
                .into_iter()
                .map(|kind| (kind, 0))
                .collect(),
            efficiency: config.efficiency.max(MIN_EFFICIENCY),
            channel,
        }
    }

    /// Current pool counts.
    pub const fn pool(&self) -> GathererPool {
        self.pool
    }

    /// Idle workers.
    pub const fn available(&self) -> u32 {
        self.pool.available
    }

    /// All workers, assigned or idle.
    pub const fn total_capacity(&self) -> u32 {
        self.pool.total_capacity
    }

    /// Current efficiency multiplier.
    pub const fn efficiency(&self) -> Decimal {
        self.efficiency
    }

    /// Workers assigned to `kind`.
    pub fn assigned(&self, kind: ResourceKind) -> u32 {
        self.assignments.get(&kind).copied().unwrap_or(0)
    }

    /// Sum of all assignments.
    pub fn total_assigned(&self) -> u32 {
        self.assignments
            .values()
            .fold(0_u32, |sum, count| sum.saturating_add(*count))
    }

    /// Set the number of workers gathering `kind` to `desired`.
    ///
    /// Raising an assignment draws the difference from the idle pool;
    /// lowering it returns workers to the pool. Publishes
    /// `AssignmentChanged` followed by `WorkersAvailableChanged`.
    ///
    /// # Errors
    ///
    /// - [`AllocatorError::CurrencyNotGatherable`] for `PrimaryCurrency`
    /// - [`AllocatorError::InsufficientWorkers`] when the increase exceeds
    ///   the idle pool
    pub fn assign(
        &mut self,
        ledger: &mut ResourceLedger,
        kind: ResourceKind,
        desired: u32,
    ) -> Result<(), AllocatorError> {
        if !kind.is_gatherable() {
            return Err(AllocatorError::CurrencyNotGatherable);
        }

        let current = self.assigned(kind);
        let available = if desired > current {
            let needed = desired.saturating_sub(current);
            self.pool
                .available
                .checked_sub(needed)
                .ok_or(AllocatorError::InsufficientWorkers {
                    kind,
                    requested: needed,
                    available: self.pool.available,
                })?
        } else {
            let freed = current.saturating_sub(desired);
            self.pool
                .available
                .checked_add(freed)
                .ok_or(AllocatorError::PoolOverflow)?
        };

        ledger.set_gatherers(kind, desired)?;
        self.assignments.insert(kind, desired);
        self.pool.available = available;

        debug!(%kind, from = current, to = desired, available, "Gatherers assigned");
        self.publish_available();
        Ok(())
    }

    /// Hire `count` new workers into the idle pool.
    ///
    /// `0` is a no-op. Publishes `WorkersAvailableChanged`.
    ///
    /// # Errors
    ///
    /// [`AllocatorError::PoolOverflow`] if the pool would exceed `u32::MAX`.
    pub fn add_workers(&mut self, count: u32) -> Result<(), AllocatorError> {
        if count == 0 {
            return Ok(());
        }

        let total_capacity = self
            .pool
            .total_capacity
            .checked_add(count)
            .ok_or(AllocatorError::PoolOverflow)?;
        let available = self
            .pool
            .available
            .checked_add(count)
            .ok_or(AllocatorError::PoolOverflow)?;

        self.pool = GathererPool {
            available,
            total_capacity,
        };
        info!(added = count, available, total_capacity, "Workers joined the lair");
        self.publish_available();
        Ok(())
    }

    /// Return every assigned worker to the idle pool.
    ///
    /// Ledger gatherer counts are zeroed without individual notifications;
    /// a single `AssignmentsReset` is published instead.
    pub fn reset_assignments(&mut self, ledger: &mut ResourceLedger) {
        for kind in ResourceKind::GATHERABLE {
            // Gatherable kinds are always accepted.
            if let Err(err) = ledger.write_gatherers(kind, 0) {
                debug!(%kind, error = %err, "Gatherer reset skipped");
            }
            self.assignments.insert(kind, 0);
        }
        self.pool.available = self.pool.total_capacity;

        info!(available = self.pool.available, "Gatherer assignments reset");
        self.channel.publish(&Notification::AssignmentsReset {
            available: self.pool.available,
            total_capacity: self.pool.total_capacity,
        });
    }

    /// Set the gathering efficiency multiplier, floored to [`MIN_EFFICIENCY`].
    ///
    /// The value becomes the production modifier of every gatherable kind.
    /// Publishes `EfficiencyChanged`.
    pub fn set_efficiency_multiplier(&mut self, ledger: &mut ResourceLedger, value: Decimal) {
        self.efficiency = value.max(MIN_EFFICIENCY);
        self.sync_efficiency(ledger);

        info!(multiplier = %self.efficiency, "Gathering efficiency changed");
        self.channel.publish(&Notification::EfficiencyChanged {
            multiplier: self.efficiency,
        });
    }

    /// Write the current efficiency into the ledger without notifying.
    pub fn sync_efficiency(&self, ledger: &mut ResourceLedger) {
        for kind in ResourceKind::GATHERABLE {
            ledger.set_production_modifier(kind, self.efficiency);
        }
    }

    fn publish_available(&self) {
        self.channel.publish(&Notification::WorkersAvailableChanged {
            available: self.pool.available,
            total_capacity: self.pool.total_capacity,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lairkeep_events::NotificationRecorder;
    use lairkeep_types::NotificationKind;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::EconomyConfig;

    struct Fixture {
        ledger: ResourceLedger,
        allocator: GathererAllocator,
        recorder: NotificationRecorder,
    }

    fn fixture() -> Fixture {
        let channel = NotificationChannel::new();
        let (recorder, _) = NotificationRecorder::attach(&channel);
        Fixture {
            ledger: ResourceLedger::new(&EconomyConfig::default(), channel.clone()),
            allocator: GathererAllocator::new(&GathererConfig::default(), channel),
            recorder,
        }
    }

    fn conserved(allocator: &GathererAllocator) -> bool {
        allocator.available().checked_add(allocator.total_assigned())
            == Some(allocator.total_capacity())
    }

    #[test]
    fn assignment_draws_from_pool_and_rejects_overdraw() {
        let mut f = fixture();
        assert_eq!(f.allocator.available(), 5);

        f.allocator.assign(&mut f.ledger, ResourceKind::Wood, 3).unwrap();
        assert_eq!(f.allocator.available(), 2);
        assert_eq!(f.allocator.assigned(ResourceKind::Wood), 3);
        assert_eq!(f.ledger.gatherers(ResourceKind::Wood), 3);

        f.recorder.clear();
        let result = f.allocator.assign(&mut f.ledger, ResourceKind::Wood, 10);
        assert!(matches!(
            result,
            Err(AllocatorError::InsufficientWorkers {
                requested: 7,
                available: 2,
                ..
            })
        ));
        assert_eq!(f.allocator.assigned(ResourceKind::Wood), 3);
        assert_eq!(f.ledger.gatherers(ResourceKind::Wood), 3);
        assert_eq!(f.allocator.available(), 2);
        assert!(f.recorder.is_empty());
        assert!(conserved(&f.allocator));
    }

    #[test]
    fn assignment_notifies_kind_then_pool() {
        let mut f = fixture();
        f.allocator.assign(&mut f.ledger, ResourceKind::Food, 2).unwrap();
        assert_eq!(
            f.recorder.notifications(),
            vec![
                Notification::AssignmentChanged {
                    kind: ResourceKind::Food,
                    new_count: 2,
                },
                Notification::WorkersAvailableChanged {
                    available: 3,
                    total_capacity: 5,
                },
            ]
        );
    }

    #[test]
    fn lowering_assignment_returns_workers() {
        let mut f = fixture();
        f.allocator.assign(&mut f.ledger, ResourceKind::Stone, 4).unwrap();
        f.allocator.assign(&mut f.ledger, ResourceKind::Stone, 1).unwrap();
        assert_eq!(f.allocator.available(), 4);
        assert!(conserved(&f.allocator));

        // Same count is accepted and still announced.
        f.recorder.clear();
        f.allocator.assign(&mut f.ledger, ResourceKind::Stone, 1).unwrap();
        assert_eq!(f.recorder.count(NotificationKind::AssignmentChanged), 1);
    }

    #[test]
    fn currency_cannot_be_gathered() {
        let mut f = fixture();
        let result = f
            .allocator
            .assign(&mut f.ledger, ResourceKind::PrimaryCurrency, 1);
        assert!(matches!(result, Err(AllocatorError::CurrencyNotGatherable)));
        assert_eq!(f.allocator.available(), 5);
        assert!(f.recorder.is_empty());
    }

    #[test]
    fn hiring_raises_both_counts() {
        let mut f = fixture();
        f.allocator.add_workers(0).unwrap();
        assert!(f.recorder.is_empty());

        f.allocator.add_workers(3).unwrap();
        assert_eq!(
            f.allocator.pool(),
            GathererPool {
                available: 8,
                total_capacity: 8
            }
        );
        assert_eq!(f.recorder.count(NotificationKind::WorkersAvailableChanged), 1);
        assert!(f.allocator.add_workers(u32::MAX).is_err());
        assert_eq!(f.allocator.total_capacity(), 8);
    }

    #[test]
    fn reset_keeps_hired_workers() {
        let mut f = fixture();
        f.allocator.add_workers(2).unwrap();
        f.allocator.assign(&mut f.ledger, ResourceKind::Wood, 4).unwrap();
        f.allocator.assign(&mut f.ledger, ResourceKind::Metal, 3).unwrap();
        f.recorder.clear();

        f.allocator.reset_assignments(&mut f.ledger);
        assert_eq!(f.allocator.available(), 7);
        assert_eq!(f.allocator.total_assigned(), 0);
        assert_eq!(f.ledger.gatherers(ResourceKind::Wood), 0);
        assert_eq!(f.ledger.gatherers(ResourceKind::Metal), 0);
        assert_eq!(
            f.recorder.notifications(),
            vec![Notification::AssignmentsReset {
                available: 7,
                total_capacity: 7,
            }]
        );
    }

    #[test]
    fn efficiency_is_floored_and_applied() {
        let mut f = fixture();
        f.allocator
            .set_efficiency_multiplier(&mut f.ledger, dec!(1.5));
        assert_eq!(f.ledger.production_modifier(ResourceKind::Knowledge), dec!(1.5));
        assert_eq!(f.ledger.production_modifier(ResourceKind::PrimaryCurrency), Decimal::ONE);

        f.allocator.set_efficiency_multiplier(&mut f.ledger, dec!(0));
        assert_eq!(f.allocator.efficiency(), dec!(0.1));
        assert_eq!(f.ledger.production_modifier(ResourceKind::Wood), dec!(0.1));
        assert_eq!(
            f.recorder.last(),
            Some(Notification::EfficiencyChanged {
                multiplier: dec!(0.1)
            })
        );
    }
}
