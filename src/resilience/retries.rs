//! Retry logic.
//!
//! # Responsibilities
//! - Re-run an async operation up to a maximum number of attempts
//! - Wait between attempts according to a `Backoff`
//! - Stop immediately on errors the caller's predicate marks as fatal
//!
//! # Design Decisions
//! - One utility shared by every step; steps only choose attempts and predicate
//! - The operation receives the 1-based attempt number so it can rebuild
//!   per-attempt state (e.g. a fresh blockhash)
//! - No sleep after the final attempt

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::resilience::backoff::Backoff;

/// Attempt budget and spacing for one retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// `max_attempts` tries, `delay` apart.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, Backoff::Fixed(delay))
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// An attempt failed with an error that must not be retried.
    #[error("{0}")]
    Fatal(E),
}

impl<E> RetryError<E> {
    /// The error from the last attempt made.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Fatal(e) => e,
        }
    }
}

/// Run `op` until it succeeds, fails fatally, or `policy.max_attempts` is reached.
pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !is_retryable(&e) => return Err(RetryError::Fatal(e)),
            Err(e) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                })
            }
            Err(e) => {
                let delay = policy.backoff.delay(attempt);
                tracing::info!(
                    op = label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt did not succeed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
