//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (loader.rs, read once at startup)
//!     → validation.rs (semantic checks)
//!     → ProvisionConfig (validated, immutable)
//!     → passed by reference into the workflow
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Components never read the environment themselves
//! - The signing secret is not part of the config; see `blockchain::wallet`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ProvisionConfig;
pub use schema::{BackoffStrategy, Commitment, FundingConfig, RetryConfig, RpcConfig, TokenConfig};
