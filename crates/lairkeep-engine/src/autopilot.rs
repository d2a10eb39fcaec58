//! Scripted player for unattended sessions.
//!
//! The [`Autopilot`] stands in for the UI: it reads session state and sends
//! the same [`Command`]s a player would. Each period it hires a worker if
//! the treasury allows (once per turn), spreads idle gatherers across the
//! least-staffed resources, buys one construction if affordable (once per
//! turn), then advances time. Events are answered with the first choice the
//! lair can pay for, or the first choice when none is affordable; raids are
//! always fought off.

use lairkeep_core::simulation::{Command, CommandError, Simulation};
use lairkeep_economy::ResourceCost;
use lairkeep_types::{GameState, ResourceKind};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Autopilot tuning, read from the `autopilot` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutopilotConfig {
    /// Price of one construction project.
    #[serde(default = "default_build_cost")]
    pub build_cost: ResourceCost,

    /// Dungeon points paid to hire one worker (default: 60).
    #[serde(default = "default_hire_cost")]
    pub hire_cost: u32,

    /// Commands allowed per turn before the session is declared stuck
    /// (default: 64).
    #[serde(default = "default_max_steps_per_turn")]
    pub max_steps_per_turn: u32,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            build_cost: default_build_cost(),
            hire_cost: default_hire_cost(),
            max_steps_per_turn: default_max_steps_per_turn(),
        }
    }
}

impl AutopilotConfig {
    /// Extract the `autopilot` section from a full config document.
    ///
    /// A missing section (or an empty document) yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Autopilot`] if the document or the section
    /// cannot be parsed.
    pub fn from_config_yaml(yaml: &str) -> Result<Self, EngineError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_yml::Value =
            serde_yml::from_str(yaml).map_err(|e| EngineError::Autopilot {
                message: format!("failed to parse config YAML: {e}"),
            })?;
        let Some(section) = raw.get("autopilot") else {
            return Ok(Self::default());
        };
        serde_yml::from_value(section.clone()).map_err(|e| EngineError::Autopilot {
            message: format!("failed to parse autopilot config: {e}"),
        })
    }
}

fn default_build_cost() -> ResourceCost {
    ResourceCost::new()
        .with(ResourceKind::Wood, 20)
        .with(ResourceKind::Stone, 10)
}

const fn default_hire_cost() -> u32 {
    60
}

const fn default_max_steps_per_turn() -> u32 {
    64
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What the autopilot did during a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutopilotReport {
    /// Turns completed.
    pub turns_played: u32,
    /// Construction projects paid for.
    pub buildings: u32,
    /// Workers hired.
    pub hires: u32,
    /// Events answered.
    pub events_resolved: u32,
    /// Raids fought off.
    pub raids_repelled: u32,
}

// ---------------------------------------------------------------------------
// Autopilot
// ---------------------------------------------------------------------------

/// Drives a [`Simulation`] without a player.
#[derive(Debug)]
pub struct Autopilot {
    config: AutopilotConfig,
    report: AutopilotReport,
    last_build_turn: Option<u32>,
    last_hire_turn: Option<u32>,
}

impl Autopilot {
    /// Create an autopilot with the given tuning.
    pub const fn new(config: AutopilotConfig) -> Self {
        Self {
            config,
            report: AutopilotReport {
                turns_played: 0,
                buildings: 0,
                hires: 0,
                events_resolved: 0,
                raids_repelled: 0,
            },
            last_build_turn: None,
            last_hire_turn: None,
        }
    }

    /// Play `max_turns` full turns of an already started session.
    ///
    /// # Errors
    ///
    /// Propagates refused commands, and fails with
    /// [`EngineError::StepBudgetExhausted`] if the turns do not complete
    /// within `max_turns * max_steps_per_turn` commands.
    pub fn run(
        &mut self,
        sim: &mut Simulation,
        max_turns: u32,
    ) -> Result<AutopilotReport, EngineError> {
        let first_turn = sim.turn();
        let budget = max_turns.saturating_mul(self.config.max_steps_per_turn);
        let mut steps: u32 = 0;

        while sim.turn().saturating_sub(first_turn) < max_turns {
            if steps >= budget {
                return Err(EngineError::StepBudgetExhausted { steps });
            }
            steps = steps.saturating_add(1);
            self.step(sim)?;
        }

        self.report.turns_played = sim.turn().saturating_sub(first_turn);
        debug!(steps, "Autopilot finished");
        Ok(self.report)
    }

    /// Act once from the current state.
    fn step(&mut self, sim: &mut Simulation) -> Result<(), EngineError> {
        match sim.state() {
            GameState::ActionSelection => self.plan_period(sim),
            GameState::Construction => self.build(sim),
            GameState::EventInteraction => self.answer_event(sim),
            GameState::CombatDefense => {
                sim.execute(Command::RequestResolveCombat)?;
                self.report.raids_repelled = self.report.raids_repelled.saturating_add(1);
                Ok(())
            }
            state => Err(EngineError::Stalled { state }),
        }
    }

    fn plan_period(&mut self, sim: &mut Simulation) -> Result<(), EngineError> {
        self.hire(sim)?;
        assign_idle(sim)?;

        let turn = sim.turn();
        let wants_build = self.last_build_turn != Some(turn)
            && !self.config.build_cost.is_empty()
            && self.config.build_cost.can_afford(sim.economy().ledger());
        let next = if wants_build {
            GameState::Construction
        } else {
            GameState::AdvanceTime
        };
        sim.execute(Command::RequestStateChange(next))?;
        Ok(())
    }

    fn hire(&mut self, sim: &mut Simulation) -> Result<(), EngineError> {
        let turn = sim.turn();
        let price = self.config.hire_cost;
        if price == 0
            || self.last_hire_turn == Some(turn)
            || sim.economy().ledger().get(ResourceKind::PrimaryCurrency) < price
        {
            return Ok(());
        }

        self.last_hire_turn = Some(turn);
        let wage = ResourceCost::new().with(ResourceKind::PrimaryCurrency, price);
        sim.execute(Command::RequestSpend(wage))?;
        sim.execute(Command::RequestAddWorkers(1))?;
        self.report.hires = self.report.hires.saturating_add(1);
        info!(turn, price, "Worker hired");
        Ok(())
    }

    fn build(&mut self, sim: &mut Simulation) -> Result<(), EngineError> {
        let turn = sim.turn();
        self.last_build_turn = Some(turn);

        match sim.execute(Command::RequestSpend(self.config.build_cost.clone())) {
            Ok(()) => {
                self.report.buildings = self.report.buildings.saturating_add(1);
                info!(turn, "Construction completed");
            }
            Err(CommandError::Ledger { source }) => {
                debug!(turn, error = %source, "Construction skipped");
            }
            Err(err) => return Err(err.into()),
        }

        sim.execute(Command::RequestStateChange(GameState::ActionSelection))?;
        Ok(())
    }

    fn answer_event(&mut self, sim: &mut Simulation) -> Result<(), EngineError> {
        let Some(event) = sim.active_event() else {
            return Err(EngineError::Stalled { state: sim.state() });
        };
        let ledger = sim.economy().ledger();
        let index = event
            .choices
            .iter()
            .position(|choice| ResourceCost::from(choice.effect.costs.clone()).can_afford(ledger))
            .unwrap_or(0);
        let title = event.title.clone();

        sim.execute(Command::RequestResolveEventChoice(index))?;
        self.report.events_resolved = self.report.events_resolved.saturating_add(1);
        info!(event = %title, choice = index, "Event answered");
        Ok(())
    }
}

/// Hand every idle gatherer, one at a time, to the least-staffed resource
/// with room left in storage. Ties go to the scarcer resource.
fn assign_idle(sim: &mut Simulation) -> Result<(), EngineError> {
    while sim.economy().allocator().available() > 0 {
        let economy = sim.economy();
        let ledger = economy.ledger();
        let allocator = economy.allocator();
        let target = ResourceKind::GATHERABLE
            .into_iter()
            .filter(|kind| ledger.capacity(*kind).admits(ledger.get(*kind).saturating_add(1)))
            .min_by_key(|kind| (allocator.assigned(*kind), ledger.get(*kind)));

        let Some(kind) = target else {
            debug!("Every store is full, leaving gatherers idle");
            return Ok(());
        };
        let count = allocator.assigned(kind).saturating_add(1);
        sim.execute(Command::RequestAssignGatherers {
            kind,
            count: i64::from(count),
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lairkeep_core::chance::ScriptedChance;
    use lairkeep_core::config::SimulationConfig;
    use lairkeep_core::content::EventCatalog;
    use lairkeep_economy::AuditResult;

    use super::*;

    const EVENTS: &str = r"
events:
  - id: toll-collector
    title: The Toll Collector
    choices:
      - text: Pay in silver
        effect:
          costs:
            metal: 500
      - text: Turn him away
";

    fn session(event_chance: f64, raid_interval: u32, catalog: EventCatalog) -> Simulation {
        let mut config = SimulationConfig::default();
        config.turn.event_chance = event_chance;
        config.raid.interval = raid_interval;
        let mut sim = Simulation::with_chance(&config, catalog, Box::new(ScriptedChance::new()));
        sim.start().unwrap();
        sim
    }

    #[test]
    fn quiet_session_builds_hires_and_stays_sound() {
        let mut sim = session(0.0, 1000, EventCatalog::default());
        let mut pilot = Autopilot::new(AutopilotConfig::default());

        let report = pilot.run(&mut sim, 2).unwrap();

        assert_eq!(report.turns_played, 2);
        assert_eq!(sim.turn(), 3);
        assert_eq!(report.hires, 1);
        assert!(report.buildings >= 1);
        assert_eq!(sim.economy().allocator().total_capacity(), 6);
        assert_eq!(sim.economy().allocator().available(), 0);
        assert_eq!(sim.audit(), AuditResult::Sound);
    }

    #[test]
    fn idle_gatherers_are_spread_evenly() {
        let mut sim = session(0.0, 1000, EventCatalog::default());
        assign_idle(&mut sim).unwrap();
        for kind in ResourceKind::GATHERABLE {
            assert_eq!(sim.economy().allocator().assigned(kind), 1);
        }
    }

    #[test]
    fn events_and_raids_are_handled() {
        let catalog = EventCatalog::parse(EVENTS).unwrap();
        let mut sim = session(1.0, 2, catalog);
        let mut pilot = Autopilot::new(AutopilotConfig::default());

        let report = pilot.run(&mut sim, 1).unwrap();

        assert_eq!(report.events_resolved, 4);
        assert_eq!(report.raids_repelled, 2);
        assert_eq!(sim.turn(), 2);
    }

    #[test]
    fn unaffordable_event_does_not_stall_the_session() {
        let yaml = r"
events:
  - id: dragon-tax
    title: The Dragon's Tax
    choices:
      - text: Pay
        effect:
          costs:
            primary_currency: 100000
";
        let mut sim = session(1.0, 1000, EventCatalog::parse(yaml).unwrap());
        let mut pilot = Autopilot::new(AutopilotConfig::default());

        let report = pilot.run(&mut sim, 1).unwrap();
        assert_eq!(report.events_resolved, 4);
        assert_eq!(sim.turn(), 2);
        assert_eq!(sim.audit(), AuditResult::Sound);
    }

    #[test]
    fn step_budget_bounds_the_session() {
        let mut sim = session(0.0, 1000, EventCatalog::default());
        let config = AutopilotConfig {
            max_steps_per_turn: 1,
            ..AutopilotConfig::default()
        };
        let result = Autopilot::new(config).run(&mut sim, 1);
        assert!(matches!(result, Err(EngineError::StepBudgetExhausted { steps: 1 })));
    }

    #[test]
    fn config_section_is_optional() {
        let config = AutopilotConfig::from_config_yaml("world:\n  seed: 7\n").unwrap();
        assert_eq!(config, AutopilotConfig::default());

        let yaml = "autopilot:\n  hire_cost: 0\n  build_cost:\n    wood: 5\n";
        let config = AutopilotConfig::from_config_yaml(yaml).unwrap();
        assert_eq!(config.hire_cost, 0);
        assert_eq!(config.build_cost, ResourceCost::new().with(ResourceKind::Wood, 5));
        assert_eq!(config.max_steps_per_turn, 64);
    }
}
