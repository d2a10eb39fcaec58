//! Turn clock, state machine, events, and session orchestration for Lairkeep.
//!
//! This crate owns the turn loop: the player picks actions, time advances
//! through four periods per turn, narrative events and raids interrupt the
//! day, and the economy accrues at each period close and turn end.
//!
//! # Modules
//!
//! - [`chance`] -- [`Chance`] trait with seeded and scripted sources.
//! - [`clock`] -- Turn number and time period.
//! - [`config`] -- Configuration loading from `lairkeep-config.yaml` into
//!   strongly-typed structs.
//! - [`content`] -- [`EventCatalog`] loading from YAML.
//! - [`encounter`] -- [`EventSelector`] and the [`EffectApplier`] contract.
//! - [`machine`] -- [`TurnStateMachine`] and its pure transition table.
//! - [`raid`] -- [`RaidCounter`] and raid strength.
//! - [`simulation`] -- [`Simulation`] session context and [`Command`]s.
//!
//! [`Chance`]: chance::Chance
//! [`EventCatalog`]: content::EventCatalog
//! [`EventSelector`]: encounter::EventSelector
//! [`EffectApplier`]: encounter::EffectApplier
//! [`TurnStateMachine`]: machine::TurnStateMachine
//! [`RaidCounter`]: raid::RaidCounter
//! [`Simulation`]: simulation::Simulation
//! [`Command`]: simulation::Command

pub mod chance;
pub mod clock;
pub mod config;
pub mod content;
pub mod encounter;
pub mod machine;
pub mod raid;
pub mod simulation;
