//! Multi-resource costs.

use std::collections::BTreeMap;

use lairkeep_types::ResourceKind;
use serde::{Deserialize, Serialize};

use crate::ledger::ResourceLedger;

/// A set of resource amounts paid together.
///
/// Zero amounts are dropped and repeated kinds are summed, so every entry
/// is a positive requirement on a distinct kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ResourceKind, u32>", into = "BTreeMap<ResourceKind, u32>")]
pub struct ResourceCost(BTreeMap<ResourceKind, u32>);

impl ResourceCost {
    /// Create an empty cost.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` of `kind` to this cost (builder style).
    #[must_use]
    pub fn with(mut self, kind: ResourceKind, amount: u32) -> Self {
        if amount > 0 {
            let entry = self.0.entry(kind).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
        self
    }

    /// Amount of `kind` required (0 if absent).
    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    /// Iterate `(kind, amount)` pairs in ledger order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        self.0.iter().map(|(kind, amount)| (*kind, *amount))
    }

    /// Number of distinct kinds required.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether this cost requires nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return whether `ledger` holds enough to pay this cost.
    pub fn can_afford(&self, ledger: &ResourceLedger) -> bool {
        ledger.has_enough(self)
    }
}

impl From<BTreeMap<ResourceKind, u32>> for ResourceCost {
    fn from(map: BTreeMap<ResourceKind, u32>) -> Self {
        map.into_iter()
            .fold(Self::new(), |cost, (kind, amount)| cost.with(kind, amount))
    }
}

impl From<ResourceCost> for BTreeMap<ResourceKind, u32> {
    fn from(cost: ResourceCost) -> Self {
        cost.0
    }
}
