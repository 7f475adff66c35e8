//! RNG module - deterministic randomness and the color bag
//!
//! Every random decision in a session (tray rolls, shape sampling, colors)
//! draws from a seeded LCG, so the same seed replays the same game.
//!
//! Colors come from a shuffled bag over the palette: each color is dealt once
//! per bag, then the bag is reshuffled.

use arrayvec::ArrayVec;

use crate::types::{ColorId, PALETTE_SIZE};

/// Seeded 32-bit LCG with the Numerical Recipes multiplier and increment
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Seed 0 is remapped to 1
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        // a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Value in `0..max`; 0 when `max` is 0
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Unit-interval float in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniformly random element of `slice`
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        slice.get(self.next_range(slice.len() as u32) as usize)
    }

    /// In-place Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Current internal state (reseeding with it resumes the sequence)
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Shuffled-bag color dispenser over the palette
#[derive(Debug, Clone)]
pub struct ColorBag {
    /// Colors left in the current bag; dealt from the end
    bag: ArrayVec<ColorId, PALETTE_SIZE>,
    rng: SimpleRng,
}

impl ColorBag {
    pub fn new(seed: u32) -> Self {
        Self {
            bag: ArrayVec::new(),
            rng: SimpleRng::new(seed),
        }
    }

    fn refill_bag(&mut self) {
        self.bag.clear();
        self.bag.extend((0..PALETTE_SIZE).map(|c| c as ColorId));
        self.rng.shuffle(&mut self.bag);
    }

    /// Deal the next color, reshuffling a fresh bag when the current one is spent
    pub fn next_color(&mut self) -> ColorId {
        if self.bag.is_empty() {
            self.refill_bag();
        }
        self.bag.pop().unwrap_or(0)
    }

    /// Colors left before the next reshuffle
    pub fn remaining(&self) -> usize {
        self.bag.len()
    }
}

impl Default for ColorBag {
    fn default() -> Self {
        Self::new(1)
    }
}
