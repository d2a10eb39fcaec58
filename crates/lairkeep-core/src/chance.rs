//! Randomness seam for event rolls and event selection.
//!
//! The state machine never touches an RNG directly. It asks a [`Chance`]
//! source, which is a seeded [`StdRng`] in real sessions and a
//! [`ScriptedChance`] in tests.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of random decisions.
pub trait Chance: Send {
    /// Return `true` with probability `p`.
    ///
    /// `p` is clamped to `[0, 1]`; non-finite values count as 0.
    fn roll(&mut self, p: f64) -> bool;

    /// Pick a uniform index in `0..len`, or `None` when `len == 0`.
    fn pick(&mut self, len: usize) -> Option<usize>;
}

/// Clamp a probability into `[0, 1]`, mapping NaN and infinities to 0.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

/// Reproducible randomness from a seed.
#[derive(Debug, Clone)]
pub struct SeededChance {
    rng: StdRng,
}

impl SeededChance {
    /// Create a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Chance for SeededChance {
    fn roll(&mut self, p: f64) -> bool {
        self.rng.random_bool(clamp_probability(p))
    }

    fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.random_range(0..len))
    }
}

/// Predetermined outcomes, consumed in order.
///
/// When the roll queue is empty a roll succeeds only for `p >= 1`. When the
/// pick queue is empty the first index is picked. Scripted picks are
/// reduced modulo `len`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChance {
    rolls: VecDeque<bool>,
    picks: VecDeque<usize>,
}

impl ScriptedChance {
    /// Create a source with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue roll outcomes.
    #[must_use]
    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = bool>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    /// Queue pick outcomes.
    #[must_use]
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }
}

impl Chance for ScriptedChance {
    fn roll(&mut self, p: f64) -> bool {
        self.rolls
            .pop_front()
            .unwrap_or_else(|| clamp_probability(p) >= 1.0)
    }

    fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = self.picks.pop_front().unwrap_or(0);
        index.checked_rem(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_extremes_are_deterministic() {
        let mut chance = SeededChance::new(9);
        for _ in 0..100 {
            assert!(!chance.roll(0.0));
            assert!(chance.roll(1.0));
            assert!(!chance.roll(f64::NAN));
            assert!(chance.roll(7.5));
            assert!(!chance.roll(-1.0));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeededChance::new(1234);
        let mut b = SeededChance::new(1234);
        for _ in 0..50 {
            assert_eq!(a.roll(0.5), b.roll(0.5));
            assert_eq!(a.pick(7), b.pick(7));
        }
    }

    #[test]
    fn picks_stay_in_range() {
        let mut chance = SeededChance::new(3);
        assert_eq!(chance.pick(0), None);
        for _ in 0..200 {
            let index = chance.pick(4);
            assert!(matches!(index, Some(i) if i < 4));
        }
    }

    #[test]
    fn scripted_outcomes_replay_in_order() {
        let mut chance = ScriptedChance::new()
            .with_rolls([true, false])
            .with_picks([5, 1]);
        assert!(chance.roll(0.0));
        assert!(!chance.roll(1.0));
        assert!(!chance.roll(0.2));
        assert!(chance.roll(1.0));
        assert_eq!(chance.pick(3), Some(2));
        assert_eq!(chance.pick(3), Some(1));
        assert_eq!(chance.pick(3), Some(0));
        assert_eq!(chance.pick(0), None);
    }
}
