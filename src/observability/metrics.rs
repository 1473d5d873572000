//! Metrics collection.
//!
//! # Metrics
//! - `provision_tx_attempts_total` (counter): submission attempts by step
//! - `provision_tx_failures_total` (counter): failed attempts by step and error kind
//! - `provision_steps_completed_total` (counter): completed workflow steps

use metrics::counter;

pub fn record_tx_attempt(step: &'static str) {
    counter!("provision_tx_attempts_total", "step" => step).increment(1);
}

pub fn record_tx_failure(step: &'static str, kind: &'static str) {
    counter!("provision_tx_failures_total", "step" => step, "kind" => kind).increment(1);
}

pub fn record_step_completed(step: &'static str) {
    counter!("provision_steps_completed_total", "step" => step).increment(1);
}
