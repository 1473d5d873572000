//! Fungible token provisioning.
//!
//! Creates a mint, attaches metadata, creates the payer's holding account,
//! mints the configured supply and revokes the mint authority, all through one
//! retrying transaction executor.

pub mod blockchain;
pub mod config;
pub mod observability;
pub mod resilience;
pub mod workflow;

pub use blockchain::{Ledger, RpcLedger, Wallet};
pub use config::ProvisionConfig;
pub use workflow::{ProvisionError, ProvisionReport, Provisioner};
