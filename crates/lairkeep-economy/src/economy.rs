//! Exclusive owner of the ledger and the worker pool.

use lairkeep_events::NotificationChannel;
use lairkeep_types::ResourceKind;
use rust_decimal::Decimal;

use crate::allocator::GathererAllocator;
use crate::config::{EconomyConfig, GathererConfig};
use crate::conservation::{self, AuditResult};
use crate::cost::ResourceCost;
use crate::ledger::ResourceLedger;
use crate::{AllocatorError, LedgerError};

/// The lair economy: a [`ResourceLedger`] plus the [`GathererAllocator`]
/// that feeds it.
///
/// Gatherer counts can only change through the methods here, which always
/// route through the allocator. Other ledger operations are reachable via
/// [`Economy::ledger_mut`].
#[derive(Debug)]
pub struct Economy {
    ledger: ResourceLedger,
    allocator: GathererAllocator,
}

impl Economy {
    /// Build the starting economy. The configured efficiency is written into
    /// the ledger's production modifiers without notifying.
    pub fn new(
        economy: &EconomyConfig,
        gatherers: &GathererConfig,
        channel: &NotificationChannel,
    ) -> Self {
        let mut ledger = ResourceLedger::new(economy, channel.clone());
        let allocator = GathererAllocator::new(gatherers, channel.clone());
        allocator.sync_efficiency(&mut ledger);
        Self { ledger, allocator }
    }

    /// Read access to the ledger.
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Write access to the ledger for resource operations.
    pub const fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    /// Read access to the allocator.
    pub const fn allocator(&self) -> &GathererAllocator {
        &self.allocator
    }

    /// See [`GathererAllocator::assign`].
    ///
    /// # Errors
    ///
    /// Propagates [`AllocatorError`] with nothing changed.
    pub fn assign_gatherers(
        &mut self,
        kind: ResourceKind,
        count: u32,
    ) -> Result<(), AllocatorError> {
        self.allocator.assign(&mut self.ledger, kind, count)
    }

    /// See [`GathererAllocator::add_workers`].
    ///
    /// # Errors
    ///
    /// Propagates [`AllocatorError::PoolOverflow`].
    pub fn add_workers(&mut self, count: u32) -> Result<(), AllocatorError> {
        self.allocator.add_workers(count)
    }

    /// See [`GathererAllocator::reset_assignments`].
    pub fn reset_assignments(&mut self) {
        self.allocator.reset_assignments(&mut self.ledger);
    }

    /// See [`GathererAllocator::set_efficiency_multiplier`].
    pub fn set_efficiency(&mut self, value: Decimal) {
        self.allocator.set_efficiency_multiplier(&mut self.ledger, value);
    }

    /// Pay `cost` all or nothing.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Insufficient`] with nothing spent.
    pub fn spend(&mut self, cost: &ResourceCost) -> Result<(), LedgerError> {
        self.ledger.spend_all(cost)
    }

    /// Run the invariant audit.
    pub fn audit(&self) -> AuditResult {
        conservation::audit(&self.ledger, &self.allocator)
    }
}
