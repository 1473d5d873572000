//! Ledger-facing types and error definitions.

use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

use crate::config::schema::Commitment;

impl From<Commitment> for CommitmentConfig {
    fn from(level: Commitment) -> Self {
        match level {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// A recent blockhash and the last block height at which it is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub hash: Hash,
    pub last_valid_block_height: u64,
}

/// Errors that can occur talking to the ledger.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The blockhash a transaction referenced is no longer accepted.
    #[error("Blockhash expired (last valid block height {last_valid_block_height})")]
    BlockhashExpired { last_valid_block_height: u64 },

    /// No final status was observed before the confirmation deadline.
    #[error("Transaction {signature} not confirmed after {secs} seconds")]
    ConfirmationTimeout { signature: Signature, secs: u64 },

    /// The node refused the transaction during preflight simulation.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The transaction landed in a block but its instructions failed.
    #[error("Transaction {signature} failed on-chain: {reason}")]
    OnChain { signature: Signature, reason: TransactionError },

    /// An instruction could not be encoded.
    #[error("Invalid instruction: {0}")]
    Instruction(String),

    /// Invalid secret key format.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Transaction could not be signed.
    #[error("Signing failed: {0}")]
    Signing(String),
}

impl BlockchainError {
    /// Whether resubmitting with a fresh blockhash may succeed.
    ///
    /// On-chain failures are not transient: repeating the operation is unsafe
    /// without re-reading ledger state. Neither is `ConfirmationTimeout`: the
    /// blockhash was still valid, so the submitted transaction may yet land.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BlockchainError::Rpc(_)
                | BlockchainError::Timeout(_)
                | BlockchainError::BlockhashExpired { .. }
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BlockchainError::Rpc(_) => "rpc",
            BlockchainError::Timeout(_) => "timeout",
            BlockchainError::BlockhashExpired { .. } => "blockhash_expired",
            BlockchainError::ConfirmationTimeout { .. } => "confirmation_timeout",
            BlockchainError::Rejected(_) => "rejected",
            BlockchainError::OnChain { .. } => "on_chain",
            BlockchainError::Instruction(_) => "instruction",
            BlockchainError::Wallet(_) => "wallet",
            BlockchainError::Signing(_) => "signing",
        }
    }
}

/// Result type for ledger operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Status of a submitted transaction at the requested commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Not yet observed at the requested commitment.
    Pending,
    /// Observed at the requested commitment and executed successfully.
    Confirmed,
    /// Observed, but the ledger reports its instructions failed.
    Failed(TransactionError),
}
