//! Turn state machine: the loop that orders actions, time, events, and raids.
//!
//! Each turn runs through four time periods. Per period the player picks any
//! number of free actions and then advances time:
//!
//! ```text
//! TurnStart ─► ActionSelection ─┬─► free action ─► ActionSelection
//!                               ├─► TurnEnd
//!                               └─► AdvanceTime ─┬─► EventInteraction ─► AdvanceTime
//!                                                ├─► CombatDefense ────► AdvanceTime
//!                                                ├─► ActionSelection   (next period)
//!                                                └─► TurnEnd           (after Night)
//! TurnEnd ─► TurnStart
//! ```
//!
//! 1. **AdvanceTime** -- (a) roll for a narrative event; a drawn event pauses
//!    the chain in `EventInteraction`. (b) Query the raid counter; a raid
//!    pauses the chain in `CombatDefense`. (c) Close the period: credit
//!    production, then move to the next period, or end the turn after Night.
//!    Re-entering after an event skips (a); re-entering after combat skips
//!    (a) and (b).
//!
//! 2. **TurnEnd** -- credit the per-turn dungeon points, increment the turn,
//!    reset to Morning.
//!
//! Automatic transitions run in an iterative loop that is capped per
//! external call. An unmapped automatic transition or a runaway chain is a
//! defect: the machine halts and refuses every later call.

use lairkeep_economy::Economy;
use lairkeep_events::NotificationChannel;
use lairkeep_types::{GameState, Notification, TimePeriod};
use tracing::{debug, error, info, warn};

use crate::chance::Chance;
use crate::clock::{ClockError, TurnClock};
use crate::config::{RaidConfig, TurnConfig};
use crate::encounter::{EffectApplier, EncounterError, EventSelector, ResolvedChoice};
use crate::raid::{self, RaidCounter};

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// What moves the machine out of its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Start-of-turn bookkeeping finished.
    TurnBegan,
    /// The player asked for a state.
    Request(GameState),
    /// Time advancement drew a narrative event.
    EventDrawn,
    /// Time advancement triggered a raid.
    RaidDue,
    /// A period closed and the next one began.
    PeriodAdvanced,
    /// Night closed; the turn is over.
    NightEnded,
    /// The active event was resolved.
    ChoiceResolved,
    /// The raid was fought off.
    CombatResolved,
    /// Turn-end accrual and rollover finished.
    TurnClosed,
}

/// Errors from the pure transition function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// No transition is defined for this state and trigger.
    #[error("no transition from {from:?} on {trigger:?}")]
    Unmapped {
        /// Current state.
        from: GameState,
        /// The trigger that has no mapping.
        trigger: Trigger,
    },
}

/// Return the state reached from `state` on `trigger`.
///
/// # Errors
///
/// Returns [`TransitionError::Unmapped`] for pairs outside the table.
pub fn transition(state: GameState, trigger: Trigger) -> Result<GameState, TransitionError> {
    use GameState as S;

    let next = match (state, trigger) {
        (S::TurnStart, Trigger::TurnBegan) => S::ActionSelection,
        (S::ActionSelection, Trigger::Request(target))
            if target.is_free_action() || matches!(target, S::AdvanceTime | S::TurnEnd) =>
        {
            target
        }
        (from, Trigger::Request(S::ActionSelection)) if from.is_free_action() => {
            S::ActionSelection
        }
        (S::AdvanceTime, Trigger::EventDrawn) => S::EventInteraction,
        (S::AdvanceTime, Trigger::RaidDue) => S::CombatDefense,
        (S::AdvanceTime, Trigger::PeriodAdvanced) => S::ActionSelection,
        (S::AdvanceTime, Trigger::NightEnded) => S::TurnEnd,
        (S::EventInteraction, Trigger::ChoiceResolved) => S::AdvanceTime,
        (S::CombatDefense, Trigger::CombatResolved) => S::AdvanceTime,
        (S::TurnEnd, Trigger::TurnClosed) => S::TurnStart,
        (from, trigger) => return Err(TransitionError::Unmapped { from, trigger }),
    };
    Ok(next)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by the state machine.
///
/// Variants for which [`MachineError::is_fatal`] is `true` halt the machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    /// The requested state is not reachable from the current one.
    #[error("cannot move from {from:?} to {to:?}")]
    IllegalRequest {
        /// Current state.
        from: GameState,
        /// Requested state.
        to: GameState,
    },

    /// The call only makes sense in another state.
    #[error("expected state {expected:?}, machine is in {actual:?}")]
    WrongState {
        /// State the call requires.
        expected: GameState,
        /// Current state.
        actual: GameState,
    },

    /// `start` was called twice.
    #[error("the session has already started")]
    AlreadyStarted,

    /// The event choice could not be resolved.
    #[error("event resolution failed: {source}")]
    Encounter {
        /// The underlying selector error.
        #[from]
        source: EncounterError,
    },

    /// An automatic transition had no mapping.
    #[error("automatic transition failed: {source}")]
    Unmapped {
        /// The underlying table error.
        #[from]
        source: TransitionError,
    },

    /// Too many automatic transitions in one call.
    #[error("automatic transition chain exceeded {limit} hops")]
    ChainLimitExceeded {
        /// The configured cap.
        limit: u32,
    },

    /// The turn counter overflowed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A fatal error already stopped the machine.
    #[error("the state machine has halted")]
    Halted,
}

impl MachineError {
    /// Return whether this error halts the machine.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unmapped { .. } | Self::ChainLimitExceeded { .. } | Self::Clock { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Collaborators the machine drives during a call.
pub struct TurnContext<'a> {
    /// Ledger and worker pool.
    pub economy: &'a mut Economy,
    /// Narrative event selector.
    pub selector: &'a mut EventSelector,
    /// Randomness for event rolls and draws.
    pub chance: &'a mut dyn Chance,
}

/// Where an `AdvanceTime` evaluation resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdvanceStage {
    /// Full evaluation: event roll, raid check, period close.
    Fresh,
    /// Back from an event: raid check, period close.
    AfterEvent,
    /// Back from combat: period close only.
    AfterRaid,
}

/// Owner of the current [`GameState`], the [`TurnClock`], and the
/// [`RaidCounter`].
#[derive(Debug)]
pub struct TurnStateMachine {
    state: GameState,
    clock: TurnClock,
    raid: RaidCounter,
    stage: AdvanceStage,
    turn_config: TurnConfig,
    raid_config: RaidConfig,
    channel: NotificationChannel,
    started: bool,
    halted: bool,
}

impl TurnStateMachine {
    /// Create a machine in `TurnStart`, turn 1, Morning.
    pub fn new(turn: &TurnConfig, raid: &RaidConfig, channel: NotificationChannel) -> Self {
        Self {
            state: GameState::TurnStart,
            clock: TurnClock::new(),
            raid: RaidCounter::from_config(raid),
            stage: AdvanceStage::Fresh,
            turn_config: turn.clone(),
            raid_config: raid.clone(),
            channel,
            started: false,
            halted: false,
        }
    }

    /// Current state.
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Current turn number.
    pub const fn turn(&self) -> u32 {
        self.clock.turn()
    }

    /// Current time period.
    pub const fn period(&self) -> TimePeriod {
        self.clock.period()
    }

    /// The raid counter.
    pub const fn raid_counter(&self) -> &RaidCounter {
        &self.raid
    }

    /// Return whether a fatal error has stopped the machine.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Announce the opening state, turn, and period, then run to the first
    /// `ActionSelection`.
    ///
    /// # Errors
    ///
    /// [`MachineError::AlreadyStarted`] on a second call, or a fatal chain
    /// error.
    pub fn start(&mut self, ctx: &mut TurnContext<'_>) -> Result<(), MachineError> {
        self.ensure_running()?;
        if self.started {
            return Err(MachineError::AlreadyStarted);
        }
        self.started = true;

        info!(turn = self.turn(), period = ?self.period(), "Session started");
        self.channel.publish(&Notification::StateChanged {
            new: self.state,
            previous: None,
        });
        self.channel.publish(&Notification::TurnChanged {
            new: self.turn(),
            previous: None,
        });
        self.channel.publish(&Notification::TimePeriodChanged {
            new: self.period(),
            previous: None,
        });

        let result = self.run_chain(ctx);
        self.settle(result)
    }

    /// Move to `target` on the player's request, then run any automatic
    /// transitions that follow.
    ///
    /// # Errors
    ///
    /// [`MachineError::IllegalRequest`] if `target` is not reachable from
    /// the current state (nothing changes), or a fatal chain error.
    pub fn request(
        &mut self,
        target: GameState,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), MachineError> {
        self.ensure_running()?;
        let Ok(next) = transition(self.state, Trigger::Request(target)) else {
            warn!(from = ?self.state, to = ?target, "State request rejected");
            return Err(MachineError::IllegalRequest {
                from: self.state,
                to: target,
            });
        };

        self.enter(next);
        let result = self.run_chain(ctx);
        self.settle(result)
    }

    /// Resolve the active event with choice `index` and resume time
    /// advancement.
    ///
    /// # Errors
    ///
    /// [`MachineError::WrongState`] outside `EventInteraction`,
    /// [`MachineError::Encounter`] if the selector rejects the choice (the
    /// machine stays put), or a fatal chain error.
    pub fn resolve_choice(
        &mut self,
        index: usize,
        effects: &mut dyn EffectApplier,
        ctx: &mut TurnContext<'_>,
    ) -> Result<ResolvedChoice, MachineError> {
        self.ensure_running()?;
        self.expect_state(GameState::EventInteraction)?;

        let resolved = ctx.selector.resolve_choice(index, ctx.economy, effects)?;

        self.stage = AdvanceStage::AfterEvent;
        let result = self.step(Trigger::ChoiceResolved).and_then(|()| self.run_chain(ctx));
        self.settle(result)?;
        Ok(resolved)
    }

    /// Report the raid as fought off and resume time advancement.
    ///
    /// # Errors
    ///
    /// [`MachineError::WrongState`] outside `CombatDefense`, or a fatal
    /// chain error.
    pub fn resolve_combat(&mut self, ctx: &mut TurnContext<'_>) -> Result<(), MachineError> {
        self.ensure_running()?;
        self.expect_state(GameState::CombatDefense)?;

        info!(turn = self.turn(), "Raid repelled");
        self.stage = AdvanceStage::AfterRaid;
        let result = self.step(Trigger::CombatResolved).and_then(|()| self.run_chain(ctx));
        self.settle(result)
    }

    // -----------------------------------------------------------------------
    // Chain
    // -----------------------------------------------------------------------

    /// Run automatic transitions until a state that waits for input.
    fn run_chain(&mut self, ctx: &mut TurnContext<'_>) -> Result<(), MachineError> {
        let limit = self.turn_config.max_chain_hops;
        let mut hops: u32 = 0;

        loop {
            if !matches!(
                self.state,
                GameState::TurnStart | GameState::AdvanceTime | GameState::TurnEnd
            ) {
                debug!(state = ?self.state, hops, "Waiting for input");
                return Ok(());
            }

            // Counted before the entry work runs.
            hops = hops.saturating_add(1);
            if hops > limit {
                return Err(MachineError::ChainLimitExceeded { limit });
            }

            let trigger = match self.state {
                GameState::AdvanceTime => self.evaluate_advance(ctx)?,
                GameState::TurnEnd => self.close_turn(ctx)?,
                _ => Trigger::TurnBegan,
            };
            self.step(trigger)?;
        }
    }

    /// Apply `trigger` through the transition table.
    fn step(&mut self, trigger: Trigger) -> Result<(), MachineError> {
        let next = transition(self.state, trigger)?;
        self.enter(next);
        Ok(())
    }

    fn enter(&mut self, next: GameState) {
        let previous = self.state;
        self.state = next;
        debug!(from = ?previous, to = ?next, "State changed");
        self.channel.publish(&Notification::StateChanged {
            new: next,
            previous: Some(previous),
        });
    }

    /// Decide where `AdvanceTime` leads.
    fn evaluate_advance(&mut self, ctx: &mut TurnContext<'_>) -> Result<Trigger, MachineError> {
        let stage = core::mem::replace(&mut self.stage, AdvanceStage::Fresh);
        let period = self.clock.period();

        if stage == AdvanceStage::Fresh && ctx.chance.roll(self.turn_config.event_chance) {
            match ctx.selector.draw(period, ctx.chance) {
                Ok(Some(_)) => return Ok(Trigger::EventDrawn),
                Ok(None) => debug!(?period, "Event roll hit an empty pool"),
                Err(err) => warn!(error = %err, "Event draw skipped"),
            }
        }

        if stage != AdvanceStage::AfterRaid && self.raid.check() {
            let strength = raid::raid_strength(&self.raid_config, self.turn());
            info!(
                turn = self.turn(),
                ?period,
                strength,
                source = %self.raid_config.source,
                "Raid triggered"
            );
            self.channel.publish(&Notification::RaidTriggered {
                strength,
                source: self.raid_config.source.clone(),
            });
            return Ok(Trigger::RaidDue);
        }

        ctx.economy.ledger_mut().process_time_advancement();

        match self.clock.advance_period() {
            Some(next) => {
                info!(turn = self.turn(), from = ?period, to = ?next, "Time period advanced");
                self.channel.publish(&Notification::TimePeriodChanged {
                    new: next,
                    previous: Some(period),
                });
                Ok(Trigger::PeriodAdvanced)
            }
            None => Ok(Trigger::NightEnded),
        }
    }

    /// Turn-end accrual and rollover.
    fn close_turn(&mut self, ctx: &mut TurnContext<'_>) -> Result<Trigger, MachineError> {
        let previous_turn = self.clock.turn();
        let previous_period = self.clock.period();
        let new_turn = self.clock.roll_over()?;

        let income = ctx.economy.ledger_mut().process_turn_completion();
        info!(previous_turn, new_turn, income, "Turn ended");

        self.channel.publish(&Notification::TurnChanged {
            new: new_turn,
            previous: Some(previous_turn),
        });
        self.channel.publish(&Notification::TimePeriodChanged {
            new: TimePeriod::Morning,
            previous: Some(previous_period),
        });
        Ok(Trigger::TurnClosed)
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    const fn ensure_running(&self) -> Result<(), MachineError> {
        if self.halted {
            Err(MachineError::Halted)
        } else {
            Ok(())
        }
    }

    fn expect_state(&self, expected: GameState) -> Result<(), MachineError> {
        if self.state == expected {
            Ok(())
        } else {
            warn!(?expected, actual = ?self.state, "Call made in the wrong state");
            Err(MachineError::WrongState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Halt on fatal errors.
    fn settle(&mut self, result: Result<(), MachineError>) -> Result<(), MachineError> {
        if let Err(err) = &result {
            if err.is_fatal() {
                self.halted = true;
                error!(
                    state = ?self.state,
                    turn = self.turn(),
                    error = %err,
                    "State machine halted"
                );
            }
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lairkeep_economy::{EconomyConfig, GathererConfig};
    use lairkeep_events::NotificationRecorder;
    use lairkeep_types::{
        Choice, ChoiceEffect, EventId, EventRecord, NotificationKind, PeriodEligibility, ResourceKind,
    };

    use super::*;
    use crate::chance::ScriptedChance;
    use crate::content::EventCatalog;
    use crate::encounter::LedgerEffectApplier;

    use GameState as S;

    // -----------------------------------------------------------------------
    // Pure transitions
    // -----------------------------------------------------------------------

    #[test]
    fn action_selection_reaches_every_action() {
        for target in [
            S::DungeonManagement,
            S::FactionNegotiation,
            S::Construction,
            S::ResourceGathering,
            S::AdvanceTime,
            S::TurnEnd,
        ] {
            assert_eq!(transition(S::ActionSelection, Trigger::Request(target)), Ok(target));
        }
        for target in [S::EventInteraction, S::CombatDefense, S::TurnStart, S::ActionSelection] {
            assert!(transition(S::ActionSelection, Trigger::Request(target)).is_err());
        }
    }

    #[test]
    fn free_actions_only_return_to_selection() {
        assert_eq!(
            transition(S::Construction, Trigger::Request(S::ActionSelection)),
            Ok(S::ActionSelection)
        );
        assert!(transition(S::Construction, Trigger::Request(S::AdvanceTime)).is_err());
        assert!(transition(S::Construction, Trigger::Request(S::DungeonManagement)).is_err());
        assert!(transition(S::EventInteraction, Trigger::Request(S::ActionSelection)).is_err());
    }

    #[test]
    fn automatic_edges() {
        assert_eq!(transition(S::TurnStart, Trigger::TurnBegan), Ok(S::ActionSelection));
        assert_eq!(transition(S::AdvanceTime, Trigger::EventDrawn), Ok(S::EventInteraction));
        assert_eq!(transition(S::AdvanceTime, Trigger::RaidDue), Ok(S::CombatDefense));
        assert_eq!(transition(S::AdvanceTime, Trigger::PeriodAdvanced), Ok(S::ActionSelection));
        assert_eq!(transition(S::AdvanceTime, Trigger::NightEnded), Ok(S::TurnEnd));
        assert_eq!(transition(S::EventInteraction, Trigger::ChoiceResolved), Ok(S::AdvanceTime));
        assert_eq!(transition(S::CombatDefense, Trigger::CombatResolved), Ok(S::AdvanceTime));
        assert_eq!(transition(S::TurnEnd, Trigger::TurnClosed), Ok(S::TurnStart));
        assert_eq!(
            transition(S::TurnEnd, Trigger::RaidDue),
            Err(TransitionError::Unmapped {
                from: S::TurnEnd,
                trigger: Trigger::RaidDue
            })
        );
    }

    // -----------------------------------------------------------------------
    // Driven machine
    // -----------------------------------------------------------------------

    struct Rig {
        machine: TurnStateMachine,
        economy: Economy,
        selector: EventSelector,
        chance: ScriptedChance,
        recorder: NotificationRecorder,
    }

    impl Rig {
        fn new(turn: TurnConfig, raid: RaidConfig, events: Vec<EventRecord>) -> Self {
            let channel = NotificationChannel::new();
            let (recorder, _) = NotificationRecorder::attach(&channel);
            Self {
                machine: TurnStateMachine::new(&turn, &raid, channel.clone()),
                economy: Economy::new(
                    &EconomyConfig::default(),
                    &GathererConfig::default(),
                    &channel,
                ),
                selector: EventSelector::new(EventCatalog::new(events).unwrap(), channel),
                chance: ScriptedChance::new(),
                recorder,
            }
        }

        fn quiet() -> Self {
            let turn = TurnConfig {
                event_chance: 0.0,
                ..TurnConfig::default()
            };
            let raid = RaidConfig {
                interval: 1000,
                ..RaidConfig::default()
            };
            Self::new(turn, raid, Vec::new())
        }

        fn ctx(&mut self) -> (&mut TurnStateMachine, TurnContext<'_>) {
            (
                &mut self.machine,
                TurnContext {
                    economy: &mut self.economy,
                    selector: &mut self.selector,
                    chance: &mut self.chance,
                },
            )
        }

        fn start(&mut self) {
            let (machine, mut ctx) = self.ctx();
            machine.start(&mut ctx).unwrap();
        }

        fn request(&mut self, target: GameState) -> Result<(), MachineError> {
            let (machine, mut ctx) = self.ctx();
            machine.request(target, &mut ctx)
        }

        fn resolve(&mut self, index: usize) -> Result<ResolvedChoice, MachineError> {
            let (machine, mut ctx) = self.ctx();
            machine.resolve_choice(index, &mut LedgerEffectApplier::new(), &mut ctx)
        }

        fn fight(&mut self) -> Result<(), MachineError> {
            let (machine, mut ctx) = self.ctx();
            machine.resolve_combat(&mut ctx)
        }
    }

    fn gift() -> EventRecord {
        EventRecord {
            id: EventId::new("gift"),
            title: "A Gift".to_owned(),
            description: String::new(),
            choices: vec![Choice {
                text: "Accept".to_owned(),
                effect: ChoiceEffect {
                    workers: 1,
                    ..ChoiceEffect::default()
                },
            }],
            occurs_in: PeriodEligibility::ANY_TIME,
        }
    }

    #[test]
    fn start_announces_and_waits_for_selection() {
        let mut rig = Rig::quiet();
        rig.start();
        assert_eq!(rig.machine.state(), S::ActionSelection);
        assert_eq!(
            rig.recorder.notifications(),
            vec![
                Notification::StateChanged {
                    new: S::TurnStart,
                    previous: None
                },
                Notification::TurnChanged {
                    new: 1,
                    previous: None
                },
                Notification::TimePeriodChanged {
                    new: TimePeriod::Morning,
                    previous: None
                },
                Notification::StateChanged {
                    new: S::ActionSelection,
                    previous: Some(S::TurnStart)
                },
            ]
        );

        let (machine, mut ctx) = rig.ctx();
        assert_eq!(machine.start(&mut ctx), Err(MachineError::AlreadyStarted));
    }

    #[test]
    fn quiet_turn_cycles_all_periods() {
        let mut rig = Rig::quiet();
        rig.start();
        rig.recorder.clear();

        for expected in [TimePeriod::Afternoon, TimePeriod::Evening, TimePeriod::Night] {
            rig.request(S::AdvanceTime).unwrap();
            assert_eq!(rig.machine.state(), S::ActionSelection);
            assert_eq!(rig.machine.period(), expected);
            assert_eq!(rig.machine.turn(), 1);
        }

        rig.request(S::AdvanceTime).unwrap();
        assert_eq!(rig.machine.state(), S::ActionSelection);
        assert_eq!(rig.machine.turn(), 2);
        assert_eq!(rig.machine.period(), TimePeriod::Morning);

        let periods: Vec<Notification> = rig.recorder.of_kind(NotificationKind::TimePeriodChanged);
        assert_eq!(
            periods.last(),
            Some(&Notification::TimePeriodChanged {
                new: TimePeriod::Morning,
                previous: Some(TimePeriod::Night)
            })
        );
        assert_eq!(
            rig.recorder.of_kind(NotificationKind::TurnChanged),
            vec![Notification::TurnChanged {
                new: 2,
                previous: Some(1)
            }]
        );
        // Four period closes plus one turn completion.
        assert_eq!(rig.recorder.count(NotificationKind::AllResourcesUpdated), 5);
        assert_eq!(rig.economy.ledger().get(ResourceKind::PrimaryCurrency), 115);
    }

    #[test]
    fn night_close_passes_through_turn_end() {
        let mut rig = Rig::quiet();
        rig.start();
        for _ in 0..3 {
            rig.request(S::AdvanceTime).unwrap();
        }
        rig.recorder.clear();
        rig.request(S::AdvanceTime).unwrap();

        let states: Vec<GameState> = rig
            .recorder
            .of_kind(NotificationKind::StateChanged)
            .into_iter()
            .filter_map(|n| match n {
                Notification::StateChanged { new, .. } => Some(new),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![S::AdvanceTime, S::TurnEnd, S::TurnStart, S::ActionSelection]
        );
    }

    #[test]
    fn free_actions_do_not_consume_time() {
        let mut rig = Rig::quiet();
        rig.start();
        rig.request(S::Construction).unwrap();
        assert_eq!(rig.machine.state(), S::Construction);
        assert!(matches!(
            rig.request(S::AdvanceTime),
            Err(MachineError::IllegalRequest { .. })
        ));
        rig.request(S::ActionSelection).unwrap();
        assert_eq!(rig.machine.period(), TimePeriod::Morning);
        assert!(!rig.machine.is_halted());
    }

    #[test]
    fn ending_the_turn_early_skips_remaining_periods() {
        let mut rig = Rig::quiet();
        rig.start();
        rig.request(S::TurnEnd).unwrap();
        assert_eq!(rig.machine.turn(), 2);
        assert_eq!(rig.machine.period(), TimePeriod::Morning);
        assert_eq!(rig.machine.state(), S::ActionSelection);
    }

    #[test]
    fn event_pauses_then_resumes_without_second_roll() {
        let turn = TurnConfig {
            event_chance: 1.0,
            ..TurnConfig::default()
        };
        let raid = RaidConfig {
            interval: 1000,
            ..RaidConfig::default()
        };
        let mut rig = Rig::new(turn, raid, vec![gift()]);
        rig.start();

        rig.request(S::AdvanceTime).unwrap();
        assert_eq!(rig.machine.state(), S::EventInteraction);
        assert_eq!(rig.machine.period(), TimePeriod::Morning);
        assert_eq!(rig.recorder.count(NotificationKind::EventStarted), 1);

        let resolved = rig.resolve(0).unwrap();
        assert_eq!(resolved.outcome.recruited, 1);
        // The re-entry does not roll again even at 100%.
        assert_eq!(rig.machine.state(), S::ActionSelection);
        assert_eq!(rig.machine.period(), TimePeriod::Afternoon);
        assert_eq!(rig.recorder.count(NotificationKind::EventStarted), 1);
        assert_eq!(rig.recorder.count(NotificationKind::EventCompleted), 1);
        assert_eq!(rig.machine.raid_counter().turns_since_last(), 1);
    }

    #[test]
    fn rejected_choice_keeps_machine_in_event() {
        let turn = TurnConfig {
            event_chance: 1.0,
            ..TurnConfig::default()
        };
        let mut rig = Rig::new(turn, RaidConfig::default(), vec![gift()]);
        rig.start();
        rig.request(S::AdvanceTime).unwrap();

        assert!(matches!(
            rig.resolve(3),
            Err(MachineError::Encounter {
                source: EncounterError::ChoiceOutOfRange { index: 3, len: 1 }
            })
        ));
        assert_eq!(rig.machine.state(), S::EventInteraction);
        assert!(!rig.machine.is_halted());
    }

    #[test]
    fn empty_event_pool_falls_through() {
        let turn = TurnConfig {
            event_chance: 1.0,
            ..TurnConfig::default()
        };
        let raid = RaidConfig {
            interval: 1000,
            ..RaidConfig::default()
        };
        let mut rig = Rig::new(turn, raid, Vec::new());
        rig.start();
        rig.request(S::AdvanceTime).unwrap();
        assert_eq!(rig.machine.state(), S::ActionSelection);
        assert_eq!(rig.machine.period(), TimePeriod::Afternoon);
    }

    #[test]
    fn raid_pauses_then_closes_period() {
        let turn = TurnConfig {
            event_chance: 0.0,
            ..TurnConfig::default()
        };
        let raid = RaidConfig {
            interval: 2,
            ..RaidConfig::default()
        };
        let mut rig = Rig::new(turn, raid, Vec::new());
        rig.start();

        rig.request(S::AdvanceTime).unwrap();
        assert_eq!(rig.machine.period(), TimePeriod::Afternoon);

        rig.request(S::AdvanceTime).unwrap();
        assert_eq!(rig.machine.state(), S::CombatDefense);
        assert_eq!(rig.machine.period(), TimePeriod::Afternoon);
        assert_eq!(
            rig.recorder.of_kind(NotificationKind::RaidTriggered),
            vec![Notification::RaidTriggered {
                strength: 12,
                source: "Adventurers' Guild".to_owned()
            }]
        );

        rig.fight().unwrap();
        assert_eq!(rig.machine.state(), S::ActionSelection);
        assert_eq!(rig.machine.period(), TimePeriod::Evening);
        assert_eq!(rig.machine.raid_counter().turns_since_last(), 0);
    }

    #[test]
    fn resolution_calls_require_their_state() {
        let mut rig = Rig::quiet();
        rig.start();
        assert!(matches!(rig.fight(), Err(MachineError::WrongState { .. })));
        assert!(matches!(rig.resolve(0), Err(MachineError::WrongState { .. })));
        assert!(!rig.machine.is_halted());
    }

    #[test]
    fn runaway_chain_halts_the_machine() {
        let turn = TurnConfig {
            event_chance: 0.0,
            max_chain_hops: 1,
        };
        let raid = RaidConfig {
            interval: 1000,
            ..RaidConfig::default()
        };
        let mut rig = Rig::new(turn, raid, Vec::new());
        rig.start();
        for _ in 0..3 {
            rig.request(S::AdvanceTime).unwrap();
        }

        // Night: AdvanceTime -> TurnEnd -> TurnStart -> ActionSelection needs 3 hops.
        let result = rig.request(S::AdvanceTime);
        assert_eq!(result, Err(MachineError::ChainLimitExceeded { limit: 1 }));
        assert!(rig.machine.is_halted());
        assert_eq!(rig.machine.state(), S::TurnEnd);
        assert_eq!(rig.machine.turn(), 1);
        assert_eq!(rig.request(S::Construction), Err(MachineError::Halted));
    }
}
