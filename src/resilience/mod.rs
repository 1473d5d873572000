//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger call fails:
//!     → retries.rs (check if retryable, retry after backoff)
//!     → backoff.rs (fixed delay, or exponential with jitter)
//! ```
//!
//! # Design Decisions
//! - Transport failures are retried; on-chain failures are not
//! - Every retried operation rebuilds its inputs per attempt
//! - Per-request timeouts live in `blockchain::client`

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::{retry, RetryError, RetryPolicy};
