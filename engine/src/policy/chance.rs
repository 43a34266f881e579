//! Uniform chance draws for reward formulas.
//!
//! Production draws come from the operating system's CSPRNG so payout
//! rolls cannot be predicted; tests inject a pinned or seeded source.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of uniform draws in `[0, 100)`.
pub trait ChanceSource: Send + Sync {
    fn draw_percent(&self) -> f64;
}

/// Cryptographically strong draws from the OS.
pub struct OsChance;

impl ChanceSource for OsChance {
    fn draw_percent(&self) -> f64 {
        OsRng.gen::<f64>() * 100.0
    }
}

/// Always returns the same value. Test seam for forcing a win or loss.
pub struct FixedChance(pub f64);

impl ChanceSource for FixedChance {
    fn draw_percent(&self) -> f64 {
        self.0
    }
}

/// Deterministic sequence from a seed. Used for convergence tests.
pub struct SeededChance {
    rng: Mutex<StdRng>,
}

impl SeededChance {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ChanceSource for SeededChance {
    fn draw_percent(&self) -> f64 {
        let mut rng = self.rng.lock().expect("chance rng poisoned");
        rng.gen::<f64>() * 100.0
    }
}
