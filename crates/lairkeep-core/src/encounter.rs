//! Narrative event selection and resolution.
//!
//! The [`EventSelector`] draws an eligible record from the [`EventCatalog`],
//! holds it as the single active event, and resolves it by choice index.
//! What a choice actually does is delegated to an [`EffectApplier`]; the
//! default [`LedgerEffectApplier`] pays costs, credits grants, and hires
//! workers through the [`Economy`].

use std::collections::BTreeMap;

use lairkeep_economy::{AllocatorError, Economy, LedgerError, ResourceCost};
use lairkeep_events::NotificationChannel;
use lairkeep_types::{ChoiceEffect, EventId, EventRecord, Notification, ResourceKind, TimePeriod};
use tracing::{debug, info, warn};

use crate::chance::Chance;
use crate::content::EventCatalog;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while applying a choice effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    /// The choice costs more than the lair holds. Nothing was spent.
    #[error("choice is unaffordable: {source}")]
    Unaffordable {
        /// The ledger's shortfall.
        #[from]
        source: LedgerError,
    },

    /// The recruited workers would not fit in the pool. Nothing was spent.
    #[error("choice cannot recruit workers: {source}")]
    Workers {
        /// The allocator's refusal.
        #[from]
        source: AllocatorError,
    },
}

/// Errors returned by the event selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncounterError {
    /// A choice was submitted while no event is active.
    #[error("no event is active")]
    NoActiveEvent,

    /// The choice index does not exist on the active event.
    #[error("choice {index} is out of range for an event with {len} choices")]
    ChoiceOutOfRange {
        /// Submitted index.
        index: usize,
        /// Number of choices the event offers.
        len: usize,
    },

    /// Another event is still waiting for a choice.
    #[error("event {active} is still active")]
    EventAlreadyActive {
        /// The unresolved event.
        active: EventId,
    },
}

// ---------------------------------------------------------------------------
// Effect application
// ---------------------------------------------------------------------------

/// What applying a choice effect changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectOutcome {
    /// Resources paid.
    pub spent: ResourceCost,
    /// Resources actually credited after capacity clamping.
    pub granted: BTreeMap<ResourceKind, u32>,
    /// Workers added to the pool.
    pub recruited: u32,
    /// Why the effect was not applied. The event still counts as resolved.
    pub refused: Option<EffectError>,
}

impl EffectOutcome {
    /// An outcome where nothing changed because the applier refused.
    pub fn not_applied(reason: EffectError) -> Self {
        Self {
            refused: Some(reason),
            ..Self::default()
        }
    }

    /// Return whether the effect took hold.
    pub const fn is_applied(&self) -> bool {
        self.refused.is_none()
    }
}

/// Applies a [`ChoiceEffect`] to the economy.
///
/// Implementations must leave the economy unchanged when they return an
/// error. The selector still resolves the event and reports the refusal in
/// the outcome's `refused` field.
pub trait EffectApplier: Send {
    /// Apply `effect`.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the effect cannot be applied in full.
    fn apply(
        &mut self,
        effect: &ChoiceEffect,
        economy: &mut Economy,
    ) -> Result<EffectOutcome, EffectError>;
}

/// Applies effects through the economy's public operations.
///
/// Costs are paid all-or-nothing first; grants are then credited with
/// capacity clamping (a full stockpile is not an error) and workers hired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerEffectApplier;

impl LedgerEffectApplier {
    /// Create a new ledger effect applier.
    pub const fn new() -> Self {
        Self
    }
}

impl EffectApplier for LedgerEffectApplier {
    fn apply(
        &mut self,
        effect: &ChoiceEffect,
        economy: &mut Economy,
    ) -> Result<EffectOutcome, EffectError> {
        let cost = ResourceCost::from(effect.costs.clone());

        // Validate everything before the first mutation.
        if effect.workers > 0
            && economy
                .allocator()
                .total_capacity()
                .checked_add(effect.workers)
                .is_none()
        {
            return Err(AllocatorError::PoolOverflow.into());
        }
        economy.spend(&cost)?;

        let mut granted = BTreeMap::new();
        for (kind, amount) in &effect.grants {
            if *amount == 0 {
                continue;
            }
            match economy.ledger_mut().add_resource(*kind, *amount) {
                Ok(added) => {
                    granted.insert(*kind, added);
                }
                Err(err) => debug!(%kind, amount, error = %err, "Grant discarded"),
            }
        }

        economy.add_workers(effect.workers)?;

        Ok(EffectOutcome {
            spent: cost,
            granted,
            recruited: effect.workers,
            refused: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// A resolved event choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChoice {
    /// The event that was resolved.
    pub id: EventId,
    /// The choice that was taken.
    pub choice_index: usize,
    /// What the choice changed.
    pub outcome: EffectOutcome,
}

/// Draws, holds, and resolves narrative events. At most one is active.
#[derive(Debug)]
pub struct EventSelector {
    catalog: EventCatalog,
    active: Option<EventRecord>,
    channel: NotificationChannel,
}

impl EventSelector {
    /// Create a selector over `catalog` with no active event.
    pub const fn new(catalog: EventCatalog, channel: NotificationChannel) -> Self {
        Self {
            catalog,
            active: None,
            channel,
        }
    }

    /// The event waiting for a choice, if any.
    pub const fn active(&self) -> Option<&EventRecord> {
        self.active.as_ref()
    }

    /// Pick a uniformly random record eligible for `period`.
    ///
    /// Returns `None` when no record is eligible.
    pub fn pick_eligible(
        &self,
        period: TimePeriod,
        chance: &mut dyn Chance,
    ) -> Option<&EventRecord> {
        let eligible = self.catalog.eligible(period);
        let index = chance.pick(eligible.len())?;
        eligible.get(index).copied()
    }

    /// Make `record` the active event and publish `EventStarted`.
    ///
    /// # Errors
    ///
    /// Returns [`EncounterError::EventAlreadyActive`] if another event has
    /// not been resolved yet.
    pub fn activate(&mut self, record: EventRecord) -> Result<(), EncounterError> {
        if let Some(active) = &self.active {
            return Err(EncounterError::EventAlreadyActive {
                active: active.id.clone(),
            });
        }

        info!(id = %record.id, title = %record.title, "Event started");
        self.channel.publish(&Notification::EventStarted {
            id: record.id.clone(),
            title: record.title.clone(),
        });
        self.active = Some(record);
        Ok(())
    }

    /// Pick and activate an event for `period`.
    ///
    /// Returns the id of the activated event, or `None` when nothing is
    /// eligible.
    ///
    /// # Errors
    ///
    /// Returns [`EncounterError::EventAlreadyActive`] if an event is active.
    pub fn draw(
        &mut self,
        period: TimePeriod,
        chance: &mut dyn Chance,
    ) -> Result<Option<EventId>, EncounterError> {
        if let Some(active) = &self.active {
            return Err(EncounterError::EventAlreadyActive {
                active: active.id.clone(),
            });
        }
        let Some(record) = self.pick_eligible(period, chance).cloned() else {
            debug!(?period, "No eligible event");
            return Ok(None);
        };
        let id = record.id.clone();
        self.activate(record)?;
        Ok(Some(id))
    }

    /// Resolve the active event with the choice at `index`.
    ///
    /// Any in-range choice resolves the event and publishes
    /// `EventCompleted`. A choice the applier refuses (for example one the
    /// lair cannot pay for) resolves with no effect, recorded in
    /// [`EffectOutcome::refused`](EffectOutcome#structfield.refused).
    ///
    /// # Errors
    ///
    /// - [`EncounterError::NoActiveEvent`] if nothing is active
    /// - [`EncounterError::ChoiceOutOfRange`] for a bad index; the event
    ///   stays active
    pub fn resolve_choice(
        &mut self,
        index: usize,
        economy: &mut Economy,
        effects: &mut dyn EffectApplier,
    ) -> Result<ResolvedChoice, EncounterError> {
        let active = self.active.as_ref().ok_or(EncounterError::NoActiveEvent)?;
        let choice = active.choice(index).ok_or(EncounterError::ChoiceOutOfRange {
            index,
            len: active.choices.len(),
        })?;

        let outcome = match effects.apply(&choice.effect, economy) {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(id = %active.id, index, error = %reason, "Choice effect not applied");
                EffectOutcome::not_applied(reason)
            }
        };

        let id = active.id.clone();
        self.active = None;

        info!(%id, choice = index, ?outcome, "Event resolved");
        self.channel.publish(&Notification::EventCompleted {
            id: id.clone(),
            choice_index: index,
        });
        Ok(ResolvedChoice {
            id,
            choice_index: index,
            outcome,
        })
    }
}
