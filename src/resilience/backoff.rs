//! Delay between retry attempts: fixed, or exponential with jitter.

use std::time::Duration;
use rand::Rng;

use crate::config::schema::{BackoffStrategy, RetryConfig};

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// How long to wait before retry number `attempt` (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                calculate_backoff(attempt, base.as_millis() as u64, max.as_millis() as u64)
            }
        }
    }
}

impl From<&RetryConfig> for Backoff {
    fn from(config: &RetryConfig) -> Self {
        match config.strategy {
            BackoffStrategy::Fixed => Backoff::Fixed(Duration::from_millis(config.delay_ms)),
            BackoffStrategy::Exponential => Backoff::Exponential {
                base: Duration::from_millis(config.delay_ms),
                max: Duration::from_millis(config.max_delay_ms),
            },
        }
    }
}
