//! The resource ledger: quantities, storage limits, gatherer slots, and
//! production modifiers for every [`ResourceKind`].
//!
//! # Invariants
//!
//! - `quantity[k] <= capacity[k]` after every mutation. Additions clamp to
//!   the limit and lowering a limit clamps the stored quantity down.
//! - `PrimaryCurrency` never has gatherers and is never produced per period;
//!   it accrues only through [`ResourceLedger::process_turn_completion`].
//! - Gatherer counts are written only by the allocator (crate-private
//!   setters), so pool accounting cannot be bypassed.
//!
//! Every mutation announces itself on the [`NotificationChannel`].

use std::collections::BTreeMap;

use lairkeep_events::NotificationChannel;
use lairkeep_types::{Notification, ResourceKind};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info};

use crate::LedgerError;
use crate::config::EconomyConfig;
use crate::cost::ResourceCost;

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Storage limit for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capacity {
    /// At most this many units (always at least 1).
    Limited(u32),
    /// No storage limit.
    Unlimited,
}

impl Capacity {
    /// Clamp `value` to this limit.
    pub const fn clamp(self, value: u32) -> u32 {
        match self {
            Self::Limited(limit) if value > limit => limit,
            _ => value,
        }
    }

    /// Return whether `value` fits under this limit.
    pub const fn admits(self, value: u32) -> bool {
        match self {
            Self::Limited(limit) => value <= limit,
            Self::Unlimited => true,
        }
    }
}

impl core::fmt::Display for Capacity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Limited(limit) => write!(f, "{limit}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Holds every resource quantity and the parameters that drive production.
#[derive(Debug)]
pub struct ResourceLedger {
    quantities: BTreeMap<ResourceKind, u32>,
    capacities: BTreeMap<ResourceKind, Capacity>,
    gatherers: BTreeMap<ResourceKind, u32>,
    modifiers: BTreeMap<ResourceKind, Decimal>,
    base_yield_per_gatherer: u32,
    currency_per_turn: u32,
    channel: NotificationChannel,
}

impl ResourceLedger {
    /// Create a ledger holding the configured starting stockpile.
    ///
    /// Starting quantities above their capacity are clamped. Nothing is
    /// published; the session announces the opening snapshot itself.
    pub fn new(config: &EconomyConfig, channel: NotificationChannel) -> Self {
        let mut quantities = BTreeMap::new();
        let mut capacities = BTreeMap::new();
        let mut gatherers = BTreeMap::new();
        let mut modifiers = BTreeMap::new();

        for kind in ResourceKind::ALL {
            let capacity = if kind.is_gatherable() {
                config
                    .capacities
                    .get(&kind)
                    .map_or(Capacity::Unlimited, |cap| Capacity::Limited((*cap).max(1)))
            } else {
                Capacity::Unlimited
            };
            let start = config.starting_resources.get(&kind).copied().unwrap_or(0);

            quantities.insert(kind, capacity.clamp(start));
            capacities.insert(kind, capacity);
            gatherers.insert(kind, 0);
            modifiers.insert(kind, Decimal::ONE);
        }

        Self {
            quantities,
            capacities,
            gatherers,
            modifiers,
            base_yield_per_gatherer: config.base_yield_per_gatherer,
            currency_per_turn: config.currency_per_turn,
            channel,
        }
    }

    /// Current quantity of `kind`.
    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.quantities.get(&kind).copied().unwrap_or(0)
    }

    /// Storage limit of `kind`.
    pub fn capacity(&self, kind: ResourceKind) -> Capacity {
        self.capacities
            .get(&kind)
            .copied()
            .unwrap_or(Capacity::Unlimited)
    }

    /// Gatherers currently producing `kind`.
    pub fn gatherers(&self, kind: ResourceKind) -> u32 {
        self.gatherers.get(&kind).copied().unwrap_or(0)
    }

    /// Production modifier applied to `kind` (1.0 = 100%).
    pub fn production_modifier(&self, kind: ResourceKind) -> Decimal {
        self.modifiers.get(&kind).copied().unwrap_or(Decimal::ONE)
    }

    /// Copy of every quantity.
    pub fn snapshot(&self) -> BTreeMap<ResourceKind, u32> {
        self.quantities.clone()
    }

    /// Copy of every gatherer assignment.
    pub fn all_gatherers(&self) -> BTreeMap<ResourceKind, u32> {
        self.gatherers.clone()
    }

    /// Add `amount` of `kind`, clamped to capacity.
    ///
    /// Returns the amount actually added.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ZeroAmount`] when `amount` is 0, and
    /// [`LedgerError::AtCapacity`] when nothing fits.
    pub fn add_resource(&mut self, kind: ResourceKind, amount: u32) -> Result<u32, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount { kind });
        }

        let old_value = self.get(kind);
        let capacity = self.capacity(kind);
        let new_value = capacity.clamp(old_value.saturating_add(amount));
        let added = new_value.saturating_sub(old_value);

        if added == 0 {
            return Err(LedgerError::AtCapacity { kind, capacity });
        }

        self.quantities.insert(kind, new_value);
        debug!(%kind, requested = amount, added, new_value, "Resource added");
        self.publish_change(kind, new_value, old_value);
        Ok(added)
    }

    /// Remove `amount` of `kind`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ZeroAmount`] when `amount` is 0, and
    /// [`LedgerError::Insufficient`] when the stockpile is too small. The
    /// ledger is unchanged on failure.
    pub fn spend_resource(&mut self, kind: ResourceKind, amount: u32) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount { kind });
        }

        let old_value = self.get(kind);
        let new_value = old_value
            .checked_sub(amount)
            .ok_or(LedgerError::Insufficient {
                kind,
                requested: amount,
                available: old_value,
            })?;

        self.quantities.insert(kind, new_value);
        debug!(%kind, amount, new_value, "Resource spent");
        self.publish_change(kind, new_value, old_value);
        Ok(())
    }

    /// Return whether every entry of `costs` is covered.
    pub fn has_enough(&self, costs: &ResourceCost) -> bool {
        self.first_shortfall(costs).is_none()
    }

    /// Pay every entry of `costs`, or nothing at all.
    ///
    /// On success each deduction publishes a `ResourceChanged`, followed by
    /// one `AllResourcesUpdated`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Insufficient`] naming the first resource that cannot
    /// be covered. No quantity changes in that case.
    pub fn spend_all(&mut self, costs: &ResourceCost) -> Result<(), LedgerError> {
        if let Some(err) = self.first_shortfall(costs) {
            return Err(err);
        }

        for (kind, amount) in costs.iter() {
            let old_value = self.get(kind);
            // Covered by the shortfall check above.
            let new_value = old_value.saturating_sub(amount);
            self.quantities.insert(kind, new_value);
            self.publish_change(kind, new_value, old_value);
        }

        debug!(entries = costs.len(), "Costs paid");
        self.publish_snapshot();
        Ok(())
    }

    /// Set the storage limit of `kind` (floored to 1).
    ///
    /// A stockpile above the new limit is clamped down and announced.
    pub fn set_capacity(&mut self, kind: ResourceKind, capacity: u32) {
        let capacity = Capacity::Limited(capacity.max(1));
        self.capacities.insert(kind, capacity);

        let old_value = self.get(kind);
        if !capacity.admits(old_value) {
            let new_value = capacity.clamp(old_value);
            self.quantities.insert(kind, new_value);
            self.publish_change(kind, new_value, old_value);
        }
        debug!(%kind, %capacity, "Capacity changed");
    }

    /// Set the production modifier of `kind` (floored to 0).
    pub fn set_production_modifier(&mut self, kind: ResourceKind, modifier: Decimal) {
        self.modifiers.insert(kind, modifier.max(Decimal::ZERO));
    }

    /// Units of `kind` produced per time period by the current gatherers.
    ///
    /// `round(gatherers * base_yield * modifier)`, rounding half to even.
    /// Always 0 for `PrimaryCurrency`, which has its own per-turn grant.
    pub fn production_rate(&self, kind: ResourceKind) -> u32 {
        if !kind.is_gatherable() {
            return 0;
        }

        let raw = Decimal::from(self.gatherers(kind))
            .checked_mul(Decimal::from(self.base_yield_per_gatherer))
            .and_then(|base| base.checked_mul(self.production_modifier(kind)));

        raw.and_then(|value| value.round().to_u32()).unwrap_or(u32::MAX)
    }

    /// Credit one time period of production for every gatherable kind.
    ///
    /// Always publishes one `AllResourcesUpdated`, even when nothing was
    /// produced. Returns the amount actually added per kind.
    pub fn process_time_advancement(&mut self) -> BTreeMap<ResourceKind, u32> {
        let mut produced = BTreeMap::new();

        for kind in ResourceKind::GATHERABLE {
            let rate = self.production_rate(kind);
            if rate == 0 {
                continue;
            }
            match self.add_resource(kind, rate) {
                Ok(added) => {
                    produced.insert(kind, added);
                }
                Err(err) => debug!(%kind, rate, error = %err, "Production discarded"),
            }
        }

        info!(?produced, "Time period production credited");
        self.publish_snapshot();
        produced
    }

    /// Credit the fixed per-turn dungeon point grant.
    ///
    /// Publishes one `AllResourcesUpdated`. Returns the amount added.
    pub fn process_turn_completion(&mut self) -> u32 {
        let added = self
            .add_resource(ResourceKind::PrimaryCurrency, self.currency_per_turn)
            .unwrap_or(0);

        info!(added, total = self.get(ResourceKind::PrimaryCurrency), "Turn income credited");
        self.publish_snapshot();
        added
    }

    /// Publish an `AllResourcesUpdated` with the current quantities.
    pub fn publish_snapshot(&self) {
        self.channel.publish(&Notification::AllResourcesUpdated {
            snapshot: self.snapshot(),
        });
    }

    /// Replace the gatherer count of `kind` and announce it.
    ///
    /// Only the allocator calls this, after it has reserved the workers.
    pub(crate) fn set_gatherers(
        &mut self,
        kind: ResourceKind,
        count: u32,
    ) -> Result<(), LedgerError> {
        self.write_gatherers(kind, count)?;
        self.channel.publish(&Notification::AssignmentChanged {
            kind,
            new_count: count,
        });
        Ok(())
    }

    /// Replace the gatherer count of `kind` without announcing it.
    ///
    /// Used for batched allocator operations that publish their own summary.
    pub(crate) fn write_gatherers(
        &mut self,
        kind: ResourceKind,
        count: u32,
    ) -> Result<(), LedgerError> {
        if !kind.is_gatherable() {
            return Err(LedgerError::NotGatherable { kind });
        }
        self.gatherers.insert(kind, count);
        debug!(%kind, count, "Gatherers set");
        Ok(())
    }

    fn first_shortfall(&self, costs: &ResourceCost) -> Option<LedgerError> {
        costs.iter().find_map(|(kind, amount)| {
            let available = self.get(kind);
            (available < amount).then_some(LedgerError::Insufficient {
                kind,
                requested: amount,
                available,
            })
        })
    }

    fn publish_change(&self, kind: ResourceKind, new_value: u32, old_value: u32) {
        self.channel.publish(&Notification::ResourceChanged {
            kind,
            new_value,
            old_value,
        });
    }
}
