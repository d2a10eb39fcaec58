//! Raid schedule.

use crate::config::RaidConfig;

/// Counts raid checks and fires on every `interval`-th one.
///
/// Querying the counter advances it: a check that does not fire still
/// counts toward the next raid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaidCounter {
    turns_since_last: u32,
    interval: u32,
}

impl RaidCounter {
    /// Create a counter firing on every `interval`-th check (floored to 1).
    pub fn new(interval: u32) -> Self {
        Self {
            turns_since_last: 0,
            interval: interval.max(1),
        }
    }

    /// Create a counter from the raid section of the configuration.
    pub fn from_config(config: &RaidConfig) -> Self {
        Self::new(config.interval)
    }

    /// Checks since the last raid.
    pub const fn turns_since_last(&self) -> u32 {
        self.turns_since_last
    }

    /// Checks between raids.
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Count one check and return whether a raid occurs now.
    ///
    /// Resets the count when it fires.
    pub fn check(&mut self) -> bool {
        self.turns_since_last = self.turns_since_last.saturating_add(1);
        if self.turns_since_last >= self.interval {
            self.turns_since_last = 0;
            true
        } else {
            false
        }
    }
}

/// Strength of a raid launched during `turn`.
pub fn raid_strength(config: &RaidConfig, turn: u32) -> u32 {
    config
        .base_strength
        .saturating_add(turn.saturating_mul(config.strength_per_turn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_fifth_check_and_resets() {
        let mut raid = RaidCounter::new(5);
        let results: Vec<bool> = (0..5).map(|_| raid.check()).collect();
        assert_eq!(results, vec![false, false, false, false, true]);
        assert_eq!(raid.turns_since_last(), 0);

        let again: Vec<bool> = (0..5).map(|_| raid.check()).collect();
        assert_eq!(again, vec![false, false, false, false, true]);
    }

    #[test]
    fn unacted_checks_still_count() {
        let mut raid = RaidCounter::new(3);
        raid.check();
        raid.check();
        assert_eq!(raid.turns_since_last(), 2);
    }

    #[test]
    fn zero_interval_is_floored() {
        let mut raid = RaidCounter::new(0);
        assert_eq!(raid.interval(), 1);
        assert!(raid.check());
        assert!(raid.check());
    }

    #[test]
    fn strength_scales_with_turn() {
        let config = RaidConfig::default();
        assert_eq!(raid_strength(&config, 1), 12);
        assert_eq!(raid_strength(&config, 5), 20);
        assert_eq!(raid_strength(&config, u32::MAX), u32::MAX);
    }
}
