//! Turn clock for a Lairkeep session.
//!
//! The clock holds the turn number (starting at 1) and the current
//! [`TimePeriod`]. Periods advance Morning → Afternoon → Evening → Night and
//! never wrap on their own: leaving Night is a turn rollover, performed by
//! [`TurnClock::roll_over`].

use lairkeep_types::TimePeriod;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Turn counter would overflow.
    #[error("turn counter overflow: cannot advance beyond u32::MAX")]
    TurnOverflow,
}

/// Turn number and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnClock {
    /// Current turn, 1-indexed.
    turn: u32,

    /// Current period within the turn.
    period: TimePeriod,
}

impl Default for TurnClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnClock {
    /// Create a clock at turn 1, Morning.
    pub const fn new() -> Self {
        Self {
            turn: 1,
            period: TimePeriod::Morning,
        }
    }

    /// Return the current turn number.
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Return the current time period.
    pub const fn period(&self) -> TimePeriod {
        self.period
    }

    /// Move to the next period of the same turn.
    ///
    /// Returns the new period, or `None` at Night, where the clock is left
    /// untouched and the turn must roll over instead.
    pub const fn advance_period(&mut self) -> Option<TimePeriod> {
        match self.period.next() {
            Some(next) => {
                self.period = next;
                Some(next)
            }
            None => None,
        }
    }

    /// Start the next turn at Morning. Returns the new turn number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TurnOverflow`] if the turn counter would exceed
    /// `u32::MAX`. The clock is unchanged in that case.
    pub fn roll_over(&mut self) -> Result<u32, ClockError> {
        self.turn = self.turn.checked_add(1).ok_or(ClockError::TurnOverflow)?;
        self.period = TimePeriod::Morning;
        Ok(self.turn)
    }
}
