//! Random sources for dice.
//!
//! Every roll in the engine goes through one injected [`RandomSource`], so a
//! host can roll with a seeded generator and tests can script exact results.
//! Peers never roll: they apply the host's resolved outcome.

use std::collections::VecDeque;

/// Uniform die rolls.
pub trait RandomSource {
    /// Rolls one die, returning a value in `1..=sides`. Zero sides yields 0.
    fn roll_die(&mut self, sides: u32) -> u32;

    fn roll_d20(&mut self) -> u32 {
        self.roll_die(20)
    }

    fn roll_dice(&mut self, count: u32, sides: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll_die(sides)).collect()
    }
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// PCG-XSH-RR: 64-bit LCG state with a xorshift-and-rotate output
/// permutation producing 32 bits per step. The same seed always yields the
/// same rolls, which makes a session replayable from its seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcgRng {
    state: u64,
}

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 0 };
        rng.step();
        rng.state = rng.state.wrapping_add(seed);
        rng.step();
        rng
    }

    #[inline]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.step();
        Self::output(old)
    }
}

impl RandomSource for PcgRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        // Rejection sampling keeps every face equally likely.
        let span = 1u64 << 32;
        let limit = span - span % u64::from(sides);
        loop {
            let value = u64::from(self.next_u32());
            if value < limit {
                return (value % u64::from(sides)) as u32 + 1;
            }
        }
    }
}

/// Replays a fixed list of rolls, cycling when it runs out.
///
/// Values are clamped into `1..=sides` of the die being rolled, so a script
/// written for d20s stays valid if a d6 is rolled in between. An empty
/// script rolls 1s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceRng {
    rolls: VecDeque<u32>,
    cursor: usize,
}

impl SequenceRng {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            cursor: 0,
        }
    }

    /// Appends rolls to the end of the script.
    pub fn push(&mut self, rolls: impl IntoIterator<Item = u32>) {
        self.rolls.extend(rolls);
    }

    /// Number of rolls consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        let value = if self.rolls.is_empty() {
            1
        } else {
            self.rolls[self.cursor % self.rolls.len()]
        };
        self.cursor += 1;
        value.clamp(1, sides)
    }
}
