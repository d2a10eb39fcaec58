//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the autopilot session.

use lairkeep_types::GameState;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lairkeep_core::config::ConfigError,
    },

    /// Event content loading failed.
    #[error("content error: {source}")]
    Content {
        /// The underlying content error.
        #[from]
        source: lairkeep_core::content::ContentError,
    },

    /// A command sent by the autopilot was refused.
    #[error("command error: {source}")]
    Command {
        /// The underlying command error.
        #[from]
        source: lairkeep_core::simulation::CommandError,
    },

    /// The `autopilot` section of the config file could not be read.
    #[error("autopilot config error: {message}")]
    Autopilot {
        /// Description of the failure.
        message: String,
    },

    /// The session rested in a state the autopilot cannot act from.
    #[error("autopilot stalled in {state:?}")]
    Stalled {
        /// The state the session was left in.
        state: GameState,
    },

    /// The session did not reach the turn limit within the step budget.
    #[error("step budget of {steps} exhausted")]
    StepBudgetExhausted {
        /// Steps taken before giving up.
        steps: u32,
    },
}
