//! Simulated lossy link.
//!
//! Stands in for a real link when no transmitter is wired up. Acceptance is
//! drawn from a `StdRng`, so runs are reproducible given a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Transport;

/// Default acceptance rate in percent.
pub const DEFAULT_SUCCESS_PERCENT: u8 = 80;

/// Transport accepting a fixed share of attempts at random.
#[derive(Debug, Clone)]
pub struct LossyTransport {
    rng: StdRng,
    success_percent: u8,
}

impl LossyTransport {
    /// Seeded from OS entropy.
    pub fn new(success_percent: u8) -> Self {
        Self::from_rng(success_percent, StdRng::from_entropy())
    }

    /// Reproducible generator.
    pub fn with_seed(success_percent: u8, seed: u64) -> Self {
        Self::from_rng(success_percent, StdRng::seed_from_u64(seed))
    }

    fn from_rng(success_percent: u8, rng: StdRng) -> Self {
        Self {
            rng,
            success_percent: success_percent.min(100),
        }
    }

    pub fn success_percent(&self) -> u8 {
        self.success_percent
    }
}

impl Default for LossyTransport {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_PERCENT)
    }
}

impl Transport for LossyTransport {
    fn send(&mut self, _frame: &[u8]) -> bool {
        self.rng.gen_ratio(u32::from(self.success_percent), 100)
    }
}
