//! Backoff policy for connecting to the host
//!
//! The host opens its listening port at roughly the same time it launches
//! the runner, so the first few connection attempts may be refused. Attempts
//! are bounded and spaced with exponential backoff plus random jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for connection retry behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total connection attempts, including the first (minimum 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential growth)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    40
}
fn default_base_delay_ms() -> u64 {
    50
}
fn default_max_delay_ms() -> u64 {
    2_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Attempts actually made; zero is treated as one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff before jitter: `base_delay * 2^attempt`, capped at `max_delay`
    fn nominal_delay_ms(&self, attempt: u32) -> u64 {
        self.base_delay_ms
            .saturating_mul(1u64 << attempt.min(10))
            .min(self.max_delay_ms)
    }

    /// Delay after the given failed attempt (0-indexed)
    ///
    /// The nominal backoff with a random ±25% offset, so runners started
    /// together do not retry in lockstep.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let nominal = self.nominal_delay_ms(attempt);
        let jitter_range = nominal / 4;
        if jitter_range == 0 {
            return Duration::from_millis(nominal);
        }
        let offset = rand::thread_rng().gen_range(0..=jitter_range * 2);
        Duration::from_millis(nominal - jitter_range + offset)
    }

    /// Worst-case time spent sleeping before giving up
    pub fn total_budget(&self) -> Duration {
        let total_ms: u64 = (0..self.attempts().saturating_sub(1))
            .map(|attempt| {
                let nominal = self.nominal_delay_ms(attempt);
                nominal + nominal / 4
            })
            .sum();
        Duration::from_millis(total_ms)
    }
}
