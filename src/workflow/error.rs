//! Provisioning errors, tagged with the step that raised them.

use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::blockchain::types::BlockchainError;
use crate::config::loader::ConfigError;
use crate::resilience::RetryError;

/// The ordered steps of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Preflight,
    MintCreation,
    MetadataAttachment,
    TokenAccount,
    Minting,
    AuthorityRevocation,
}

impl Step {
    /// Stable identifier for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Preflight => "preflight",
            Step::MintCreation => "mint_creation",
            Step::MetadataAttachment => "metadata_attachment",
            Step::TokenAccount => "token_account",
            Step::Minting => "minting",
            Step::AuthorityRevocation => "authority_revocation",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Preflight => "preflight",
            Step::MintCreation => "mint creation",
            Step::MetadataAttachment => "metadata attachment",
            Step::TokenAccount => "token account creation",
            Step::Minting => "minting",
            Step::AuthorityRevocation => "authority revocation",
        };
        f.write_str(name)
    }
}

/// Everything that can stop a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Missing or malformed configuration or signing credential.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A read-only ledger query failed.
    #[error("Cannot reach RPC endpoint during {step}: {source}")]
    Connectivity {
        step: Step,
        #[source]
        source: BlockchainError,
    },

    /// The payer cannot cover the step about to run.
    #[error(
        "Insufficient balance for {step}. Has {} SOL, needs {} SOL",
        lamports_to_sol(*.balance),
        lamports_to_sol(*.required)
    )]
    InsufficientFunds { step: Step, balance: u64, required: u64 },

    /// Submission or confirmation kept failing until the attempt budget ran out.
    #[error("{step} transaction failed after {attempts} attempt(s): {last_error}")]
    TransactionFailed {
        step: Step,
        attempts: u32,
        #[source]
        last_error: BlockchainError,
    },

    /// An instruction could not be encoded; nothing was submitted.
    #[error("Cannot build {step} instruction: {source}")]
    InstructionBuild {
        step: Step,
        #[source]
        source: BlockchainError,
    },

    /// The ledger executed the transaction and reported that it failed. Never retried.
    #[error("{step} transaction failed on-chain: {source}")]
    OnChainLogic {
        step: Step,
        #[source]
        source: BlockchainError,
    },

    /// The metadata account did not become readable after its transaction confirmed.
    #[error("Failed to verify metadata account {address} after {attempts} lookups")]
    MetadataVerificationFailed { address: Pubkey, attempts: u32 },

    /// Ledger state read back after a step does not match what the step wrote.
    #[error("{step} verification failed: {reason}")]
    Verification { step: Step, reason: String },

    #[error("Failed to create token mint: {0}")]
    MintCreationFailed(#[source] Box<ProvisionError>),

    #[error("Failed to create token account: {0}")]
    TokenAccountFailed(#[source] Box<ProvisionError>),

    #[error("Failed to mint initial supply: {0}")]
    MintingFailed(#[source] Box<ProvisionError>),

    #[error("Failed to remove mint authority: {0}")]
    AuthorityRevocationFailed(#[source] Box<ProvisionError>),
}

impl ProvisionError {
    /// Classify the result of a retried submission.
    pub fn from_execution(step: Step, err: RetryError<BlockchainError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => ProvisionError::TransactionFailed {
                step,
                attempts,
                last_error: last,
            },
            RetryError::Fatal(source @ BlockchainError::OnChain { .. })
            | RetryError::Fatal(source @ BlockchainError::Rejected(_)) => {
                ProvisionError::OnChainLogic { step, source }
            }
            RetryError::Fatal(last_error) => ProvisionError::TransactionFailed {
                step,
                attempts: 1,
                last_error,
            },
        }
    }

    /// A ledger read failed.
    pub fn connectivity(step: Step) -> impl FnOnce(BlockchainError) -> Self {
        move |source| ProvisionError::Connectivity { step, source }
    }

    /// An instruction builder failed.
    pub fn instruction(step: Step) -> impl FnOnce(BlockchainError) -> Self {
        move |source| ProvisionError::InstructionBuild { step, source }
    }

    pub fn verification(step: Step, reason: impl Into<String>) -> Self {
        ProvisionError::Verification {
            step,
            reason: reason.into(),
        }
    }

    /// The error beneath any step wrappers.
    pub fn innermost(&self) -> &ProvisionError {
        match self {
            ProvisionError::MintCreationFailed(inner)
            | ProvisionError::TokenAccountFailed(inner)
            | ProvisionError::MintingFailed(inner)
            | ProvisionError::AuthorityRevocationFailed(inner) => inner.innermost(),
            other => other,
        }
    }

    /// The step that raised the error, if any.
    pub fn step(&self) -> Option<Step> {
        match self.innermost() {
            ProvisionError::Configuration(_) => None,
            ProvisionError::Connectivity { step, .. }
            | ProvisionError::InsufficientFunds { step, .. }
            | ProvisionError::TransactionFailed { step, .. }
            | ProvisionError::InstructionBuild { step, .. }
            | ProvisionError::OnChainLogic { step, .. }
            | ProvisionError::Verification { step, .. } => Some(*step),
            ProvisionError::MetadataVerificationFailed { .. } => Some(Step::MetadataAttachment),
            _ => None,
        }
    }
}
