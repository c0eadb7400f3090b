//! Chain fault injection
//!
//! Simulates an unreliable RPC endpoint:
//! - Read latency with uniform jitter
//! - Whole-call failures on campaign reads and participation batches
//! - Individual participation entries missing from a batch

use std::time::Duration;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::Rng;

/// Fault profile of a simulated chain
#[derive(Clone, Debug)]
pub struct ChainChaos {
    /// Base latency of every read
    pub base_latency: Duration,
    /// Extra latency, uniform in `0..=jitter_ms`
    pub jitter_ms: u64,
    /// Probability a campaign-level read fails (0.0 - 1.0)
    pub read_failure_rate: f64,
    /// Probability a whole participation batch fails
    pub batch_failure_rate: f64,
    /// Probability a single participation entry comes back empty
    pub entry_drop_rate: f64,
}

impl Default for ChainChaos {
    fn default() -> Self {
        ChainChaos {
            base_latency: Duration::from_millis(20),
            jitter_ms: 20,
            read_failure_rate: 0.01,
            batch_failure_rate: 0.05,
            entry_drop_rate: 0.02,
        }
    }
}

impl ChainChaos {
    /// Perfect endpoint
    pub fn calm() -> Self {
        ChainChaos {
            base_latency: Duration::ZERO,
            jitter_ms: 0,
            read_failure_rate: 0.0,
            batch_failure_rate: 0.0,
            entry_drop_rate: 0.0,
        }
    }

    /// Frequent transient failures that retries usually absorb
    pub fn flaky() -> Self {
        ChainChaos {
            base_latency: Duration::from_millis(50),
            jitter_ms: 100,
            read_failure_rate: 0.1,
            batch_failure_rate: 0.3,
            entry_drop_rate: 0.1,
        }
    }

    /// Participation reads never succeed
    pub fn participation_outage() -> Self {
        ChainChaos {
            batch_failure_rate: 1.0,
            ..ChainChaos::calm()
        }
    }

    /// Sample the latency of one call
    pub fn latency(&self, rng: &mut StdRng) -> Duration {
        if self.jitter_ms == 0 {
            return self.base_latency;
        }
        let jitter = Uniform::new_inclusive(0, self.jitter_ms).sample(rng);
        self.base_latency + Duration::from_millis(jitter)
    }

    pub fn read_fails(&self, rng: &mut StdRng) -> bool {
        roll(rng, self.read_failure_rate)
    }

    pub fn batch_fails(&self, rng: &mut StdRng) -> bool {
        roll(rng, self.batch_failure_rate)
    }

    pub fn entry_dropped(&self, rng: &mut StdRng) -> bool {
        roll(rng, self.entry_drop_rate)
    }
}

fn roll(rng: &mut StdRng, rate: f64) -> bool {
    rate > 0.0 && rng.gen::<f64>() < rate
}
