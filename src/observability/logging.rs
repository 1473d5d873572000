//! Structured logging.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "token_provision=info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; `verbose` lowers the default to debug.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "token_provision=debug"
    } else {
        DEFAULT_FILTER
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
