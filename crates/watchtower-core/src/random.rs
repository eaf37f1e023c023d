// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable randomness for gating, template choice, and delay jitter.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random draws.
///
/// Every probabilistic decision in Watchtower goes through this trait so
/// tests can substitute a seeded or scripted source.
pub trait RandomSource: Send + Sync {
    /// A uniform draw in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// A uniform index in `0..len`. Returns 0 when `len` is 0.
    fn pick_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }

    /// A uniform integer in `[low, high]`. Returns `low` when the range is empty.
    fn range_inclusive(&self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as f64;
        low + ((self.next_f64() * span) as u64).min(high - low)
    }

    /// True with the given probability.
    fn chance(&self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

/// Thread-local OS-seeded randomness for production use.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

/// Deterministic randomness from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.r#gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_agree() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn pick_index_stays_in_bounds() {
        let rng = SeededRandom::new(7);
        for _ in 0..1000 {
            assert!(rng.pick_index(3) < 3);
        }
        assert_eq!(rng.pick_index(0), 0);
    }

    #[test]
    fn range_inclusive_handles_degenerate_ranges() {
        let rng = ThreadRandom;
        assert_eq!(rng.range_inclusive(5, 5), 5);
        assert_eq!(rng.range_inclusive(9, 3), 9);
        for _ in 0..100 {
            let v = rng.range_inclusive(10, 20);
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn chance_extremes() {
        let rng = SeededRandom::new(1);
        for _ in 0..100 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }
}
