//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Workflow steps and the transaction executor produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Structured fields (step, attempt, signature) on every event
//! - Secrets never reach a log line
//! - Metrics are no-ops unless an embedding process installs a recorder

pub mod logging;
pub mod metrics;
