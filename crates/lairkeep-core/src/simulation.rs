//! Session context and command surface.
//!
//! A [`Simulation`] exclusively owns every component of a session: the
//! [`Economy`], the [`EventSelector`], the [`TurnStateMachine`], the
//! randomness source, and the effect applier. External control layers talk
//! to it only through [`Simulation::execute`] and observe it only through
//! the [`NotificationChannel`].
//!
//! After every command the economy invariants are audited. A broken
//! invariant is logged as an `ECONOMY_ANOMALY`; it never reaches the caller
//! as a command failure.

use lairkeep_economy::{AllocatorError, AuditResult, Economy, LedgerError, ResourceCost};
use lairkeep_events::NotificationChannel;
use lairkeep_types::{EventRecord, GameState, Notification, ResourceKind, TimePeriod};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use crate::chance::{Chance, SeededChance};
use crate::config::SimulationConfig;
use crate::content::EventCatalog;
use crate::encounter::{EffectApplier, EventSelector, LedgerEffectApplier};
use crate::machine::{MachineError, TurnContext, TurnStateMachine};

/// A request from the control layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move the state machine to a state.
    RequestStateChange(GameState),
    /// Set the number of gatherers on a resource.
    RequestAssignGatherers {
        /// Resource to assign.
        kind: ResourceKind,
        /// Desired gatherer count; negative counts are rejected.
        count: i64,
    },
    /// Hire workers into the idle pool; counts `<= 0` do nothing.
    RequestAddWorkers(i64),
    /// Resolve the active event with the choice at this index.
    RequestResolveEventChoice(usize),
    /// Set the gathering efficiency multiplier.
    RequestSetEfficiency(Decimal),
    /// Report the current raid as fought off.
    RequestResolveCombat,
    /// Return every assigned gatherer to the idle pool.
    RequestResetAssignments,
    /// Pay a resource cost, all or nothing.
    RequestSpend(ResourceCost),
}

/// Why a command was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// A count was negative.
    #[error("count must not be negative, got {count}")]
    NegativeCount {
        /// The submitted count.
        count: i64,
    },

    /// A count does not fit the worker pool's range.
    #[error("count {count} is too large")]
    CountTooLarge {
        /// The submitted count.
        count: i64,
    },

    /// The state machine refused the command.
    #[error("{source}")]
    Machine {
        /// The underlying machine error.
        #[from]
        source: MachineError,
    },

    /// The allocator refused the command.
    #[error("{source}")]
    Allocator {
        /// The underlying allocator error.
        #[from]
        source: AllocatorError,
    },

    /// The ledger refused the command.
    #[error("{source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// A fatal error stopped the session; no further commands are accepted.
    #[error("the session has halted")]
    Halted,
}

/// One Lairkeep session.
pub struct Simulation {
    economy: Economy,
    selector: EventSelector,
    machine: TurnStateMachine,
    chance: Box<dyn Chance>,
    effects: Box<dyn EffectApplier>,
    channel: NotificationChannel,
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("state", &self.machine.state())
            .field("turn", &self.machine.turn())
            .field("period", &self.machine.period())
            .field("economy", &self.economy)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Build a session seeded from `config.world.seed`, applying choice
    /// effects with the [`LedgerEffectApplier`].
    pub fn new(config: &SimulationConfig, catalog: EventCatalog) -> Self {
        Self::with_chance(config, catalog, Box::new(SeededChance::new(config.world.seed)))
    }

    /// Build a session with a custom randomness source.
    pub fn with_chance(
        config: &SimulationConfig,
        catalog: EventCatalog,
        chance: Box<dyn Chance>,
    ) -> Self {
        let channel = NotificationChannel::new();
        Self {
            economy: Economy::new(&config.economy, &config.gatherers, &channel),
            selector: EventSelector::new(catalog, channel.clone()),
            machine: TurnStateMachine::new(&config.turn, &config.raid, channel.clone()),
            chance,
            effects: Box::new(LedgerEffectApplier::new()),
            channel,
        }
    }

    /// Replace the choice effect applier.
    #[must_use]
    pub fn with_effects(mut self, effects: Box<dyn EffectApplier>) -> Self {
        self.effects = effects;
        self
    }

    /// The channel every notification of this session is published on.
    pub const fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// The session's economy, read-only.
    pub const fn economy(&self) -> &Economy {
        &self.economy
    }

    /// Current game state.
    pub const fn state(&self) -> GameState {
        self.machine.state()
    }

    /// Current turn number.
    pub const fn turn(&self) -> u32 {
        self.machine.turn()
    }

    /// Current time period.
    pub const fn period(&self) -> TimePeriod {
        self.machine.period()
    }

    /// The event waiting for a choice, if any.
    pub const fn active_event(&self) -> Option<&EventRecord> {
        self.selector.active()
    }

    /// Return whether a fatal error has stopped the session.
    pub const fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    /// Announce the opening economy and run to the first action selection.
    ///
    /// # Errors
    ///
    /// Fails if the session was already started or has halted.
    pub fn start(&mut self) -> Result<(), CommandError> {
        if self.is_halted() {
            return Err(CommandError::Halted);
        }

        let (machine, mut ctx, _) = self.parts();
        machine.start(&mut ctx)?;

        self.economy.ledger().publish_snapshot();
        let pool = self.economy.allocator().pool();
        self.channel.publish(&Notification::WorkersAvailableChanged {
            available: pool.available,
            total_capacity: pool.total_capacity,
        });
        self.check_invariants();
        Ok(())
    }

    /// Execute one command.
    ///
    /// Every command either succeeds (its notifications have fired) or
    /// fails with a [`CommandError`] and changes nothing, except for fatal
    /// machine errors, after which the session refuses all commands.
    ///
    /// # Errors
    ///
    /// See [`CommandError`].
    pub fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        if self.is_halted() {
            warn!(?command, "Command refused: session halted");
            return Err(CommandError::Halted);
        }

        debug!(?command, state = ?self.state(), "Executing command");
        let result = self.dispatch(command.clone());
        if let Err(err) = &result {
            warn!(?command, error = %err, "Command rejected");
        }
        self.check_invariants();
        result
    }

    /// Run the economy invariant audit.
    pub fn audit(&self) -> AuditResult {
        self.economy.audit()
    }

    fn dispatch(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::RequestStateChange(target) => {
                let (machine, mut ctx, _) = self.parts();
                machine.request(target, &mut ctx)?;
            }
            Command::RequestAssignGatherers { kind, count } => {
                let count = to_count(count)?;
                self.economy.assign_gatherers(kind, count)?;
            }
            Command::RequestAddWorkers(count) => {
                if count <= 0 {
                    debug!(count, "Non-positive worker count ignored");
                    return Ok(());
                }
                self.economy.add_workers(to_count(count)?)?;
            }
            Command::RequestResolveEventChoice(index) => {
                let (machine, mut ctx, effects) = self.parts();
                machine.resolve_choice(index, effects, &mut ctx)?;
            }
            Command::RequestSetEfficiency(value) => self.economy.set_efficiency(value),
            Command::RequestResolveCombat => {
                let (machine, mut ctx, _) = self.parts();
                machine.resolve_combat(&mut ctx)?;
            }
            Command::RequestResetAssignments => self.economy.reset_assignments(),
            Command::RequestSpend(cost) => self.economy.spend(&cost)?,
        }
        Ok(())
    }

    fn parts(&mut self) -> (&mut TurnStateMachine, TurnContext<'_>, &mut dyn EffectApplier) {
        (
            &mut self.machine,
            TurnContext {
                economy: &mut self.economy,
                selector: &mut self.selector,
                chance: self.chance.as_mut(),
            },
            self.effects.as_mut(),
        )
    }

    fn check_invariants(&self) {
        match self.economy.audit() {
            AuditResult::Sound => {}
            AuditResult::Anomaly(anomaly) => {
                error!(
                    turn = self.turn(),
                    state = ?self.state(),
                    violations = anomaly.violations.len(),
                    "{anomaly}"
                );
            }
        }
    }
}

/// Convert a control-layer count into a pool count.
fn to_count(count: i64) -> Result<u32, CommandError> {
    if count < 0 {
        return Err(CommandError::NegativeCount { count });
    }
    u32::try_from(count).map_err(|_err| CommandError::CountTooLarge { count })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lairkeep_events::NotificationRecorder;
    use lairkeep_types::NotificationKind;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::chance::ScriptedChance;

    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.turn.event_chance = 0.0;
        config.raid.interval = 1000;
        config
    }

    fn started() -> (Simulation, NotificationRecorder) {
        let mut sim = Simulation::with_chance(
            &quiet_config(),
            EventCatalog::default(),
            Box::new(ScriptedChance::new()),
        );
        let (recorder, _) = NotificationRecorder::attach(sim.channel());
        sim.start().unwrap();
        (sim, recorder)
    }

    #[test]
    fn start_announces_opening_economy() {
        let (sim, recorder) = started();
        assert_eq!(sim.state(), GameState::ActionSelection);
        assert_eq!(recorder.count(NotificationKind::AllResourcesUpdated), 1);
        assert_eq!(
            recorder.last(),
            Some(Notification::WorkersAvailableChanged {
                available: 5,
                total_capacity: 5
            })
        );
        assert_eq!(sim.audit(), AuditResult::Sound);
    }

    #[test]
    fn starting_twice_is_refused() {
        let (mut sim, _) = started();
        assert_eq!(
            sim.start(),
            Err(CommandError::Machine {
                source: MachineError::AlreadyStarted
            })
        );
    }

    #[test]
    fn negative_and_oversized_counts_are_rejected() {
        let (mut sim, recorder) = started();
        recorder.clear();
        assert_eq!(
            sim.execute(Command::RequestAssignGatherers {
                kind: ResourceKind::Wood,
                count: -1
            }),
            Err(CommandError::NegativeCount { count: -1 })
        );
        assert_eq!(
            sim.execute(Command::RequestAssignGatherers {
                kind: ResourceKind::Wood,
                count: i64::MAX
            }),
            Err(CommandError::CountTooLarge { count: i64::MAX })
        );
        assert!(recorder.is_empty());
    }

    #[test]
    fn non_positive_hiring_is_a_no_op() {
        let (mut sim, recorder) = started();
        recorder.clear();
        sim.execute(Command::RequestAddWorkers(0)).unwrap();
        sim.execute(Command::RequestAddWorkers(-4)).unwrap();
        assert!(recorder.is_empty());

        sim.execute(Command::RequestAddWorkers(2)).unwrap();
        assert_eq!(sim.economy().allocator().total_capacity(), 7);
    }

    #[test]
    fn economy_commands_reach_the_economy() {
        let (mut sim, _) = started();
        sim.execute(Command::RequestAssignGatherers {
            kind: ResourceKind::Food,
            count: 4,
        })
        .unwrap();
        sim.execute(Command::RequestSetEfficiency(dec!(0.5))).unwrap();
        assert_eq!(sim.economy().ledger().production_rate(ResourceKind::Food), 10);

        sim.execute(Command::RequestResetAssignments).unwrap();
        assert_eq!(sim.economy().allocator().available(), 5);

        let cost = ResourceCost::new().with(ResourceKind::Wood, 31);
        assert!(matches!(
            sim.execute(Command::RequestSpend(cost)),
            Err(CommandError::Ledger { .. })
        ));
        sim.execute(Command::RequestSpend(ResourceCost::new().with(ResourceKind::Wood, 30)))
            .unwrap();
        assert_eq!(sim.economy().ledger().get(ResourceKind::Wood), 0);
    }

    #[test]
    fn illegal_state_request_is_a_validation_failure() {
        let (mut sim, _) = started();
        let result = sim.execute(Command::RequestStateChange(GameState::CombatDefense));
        assert!(matches!(
            result,
            Err(CommandError::Machine {
                source: MachineError::IllegalRequest { .. }
            })
        ));
        assert!(!sim.is_halted());
        sim.execute(Command::RequestStateChange(GameState::DungeonManagement))
            .unwrap();
    }

    #[test]
    fn halted_session_refuses_everything() {
        let mut config = quiet_config();
        config.turn.max_chain_hops = 1;
        let mut sim = Simulation::with_chance(
            &config,
            EventCatalog::default(),
            Box::new(ScriptedChance::new()),
        );
        sim.start().unwrap();
        let result = sim.execute(Command::RequestStateChange(GameState::TurnEnd));
        assert!(matches!(
            result,
            Err(CommandError::Machine {
                source: MachineError::ChainLimitExceeded { limit: 1 }
            })
        ));
        assert!(sim.is_halted());
        assert_eq!(
            sim.execute(Command::RequestAddWorkers(1)),
            Err(CommandError::Halted)
        );
    }

    struct Refusing;

    impl EffectApplier for Refusing {
        fn apply(
            &mut self,
            _effect: &lairkeep_types::ChoiceEffect,
            _economy: &mut Economy,
        ) -> Result<crate::encounter::EffectOutcome, crate::encounter::EffectError> {
            Err(LedgerError::ZeroAmount {
                kind: ResourceKind::Wood,
            }
            .into())
        }
    }

    #[test]
    fn custom_effect_applier_is_used() {
        let yaml = "events:
  - id: gift
    title: A Gift
    choices:
      - text: Accept
        effect:
          grants:
            wood: 5
";
        let mut config = quiet_config();
        config.turn.event_chance = 1.0;
        let mut sim = Simulation::with_chance(
            &config,
            EventCatalog::parse(yaml).unwrap(),
            Box::new(ScriptedChance::new()),
        )
        .with_effects(Box::new(Refusing));
        sim.start().unwrap();
        sim.execute(Command::RequestStateChange(GameState::AdvanceTime))
            .unwrap();
        assert_eq!(sim.state(), GameState::EventInteraction);

        // The refusal still resolves the event and the day moves on.
        sim.execute(Command::RequestResolveEventChoice(0)).unwrap();
        assert_eq!(sim.state(), GameState::ActionSelection);
        assert_eq!(sim.period(), TimePeriod::Afternoon);
        assert!(sim.active_event().is_none());
        assert_eq!(sim.economy().ledger().get(ResourceKind::Wood), 30);
    }
}
