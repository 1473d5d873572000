//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (secret key)
//!     → wallet.rs (key loading, signing)
//! Config (RPC URLs, commitment, timeouts)
//!     → client.rs (Ledger trait, RPC connection with timeouts + failover)
//! Step inputs (mint, owner, amount)
//!     → instructions.rs (program instruction builders, metadata address)
//!     → transaction.rs (blockhash, sign, submit, confirm, retry)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or API keys
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod instructions;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{Ledger, RpcLedger};
pub use transaction::{TransactionOutcome, TxExecutor};
pub use types::{BlockchainError, BlockchainResult, ConfirmationStatus, LatestBlockhash};
pub use wallet::Wallet;
