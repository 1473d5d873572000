//! Provisioning workflow.
//!
//! # Data Flow
//! ```text
//! preflight.rs   connectivity + aggregate balance      → Funded
//! mint.rs        create mint, re-confirm its signature  → MintHandle
//! metadata.rs    metadata record + visibility polling   → MetadataHandle
//! supply.rs      holding account                        → TokenAccountHandle
//!                mint full supply                       → MintedSupply
//! authority.rs   revoke mint authority + verify         → ProvisionReport
//! ```
//!
//! Each step consumes the previous step's handle by value, so the order is
//! fixed at compile time. Every submission goes through `TxExecutor`.
//!
//! # Design Decisions
//! - Steps are not idempotent on the ledger; a failed run is never rolled back
//! - On-chain failures are never retried
//! - Every step error is wrapped with the step it came from

pub mod authority;
pub mod error;
pub mod metadata;
pub mod mint;
pub mod preflight;
pub mod report;
pub mod supply;

use std::time::Duration;

use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::blockchain::client::Ledger;
use crate::blockchain::transaction::TxExecutor;
use crate::blockchain::wallet::Wallet;
use crate::config::loader::ConfigError;
use crate::config::schema::ProvisionConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::resilience::{Backoff, RetryPolicy};

pub use error::{ProvisionError, Step};
pub use report::ProvisionReport;

/// Proof that preflight passed.
#[derive(Debug)]
pub struct Funded {
    balance: u64,
}

impl Funded {
    /// Payer balance observed by preflight, in lamports.
    pub fn balance(&self) -> u64 {
        self.balance
    }
}

/// A mint created by this run.
#[derive(Debug, Clone)]
pub struct MintHandle {
    address: Pubkey,
    signature: Signature,
    decimals: u8,
}

impl MintHandle {
    pub fn address(&self) -> Pubkey {
        self.address
    }

    /// Signature of the creation transaction, as found by the independent lookup.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// A mint with its metadata record attached.
#[derive(Debug, Clone)]
pub struct MetadataHandle {
    mint: MintHandle,
    address: Pubkey,
    signature: Signature,
}

impl MetadataHandle {
    pub fn mint(&self) -> &MintHandle {
        &self.mint
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }
}

/// The payer's holding account for the mint.
#[derive(Debug, Clone)]
pub struct TokenAccountHandle {
    metadata: MetadataHandle,
    address: Pubkey,
    /// `None` when the account already existed.
    signature: Option<Signature>,
}

impl TokenAccountHandle {
    pub fn metadata(&self) -> &MetadataHandle {
        &self.metadata
    }

    pub fn mint(&self) -> &MintHandle {
        &self.metadata.mint
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn signature(&self) -> Option<Signature> {
        self.signature
    }
}

/// The full supply credited to the holding account.
#[derive(Debug, Clone)]
pub struct MintedSupply {
    account: TokenAccountHandle,
    amount: u64,
    signature: Signature,
}

impl MintedSupply {
    pub fn account(&self) -> &TokenAccountHandle {
        &self.account
    }

    pub fn mint(&self) -> &MintHandle {
        self.account.mint()
    }

    /// Credited amount in base units.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }
}

/// Drives one provisioning run against a ledger.
pub struct Provisioner<L> {
    ledger: L,
    wallet: Wallet,
    config: ProvisionConfig,
    /// Supply in base units, derived once from the validated config.
    amount: u64,
}

impl<L: Ledger> Provisioner<L> {
    /// Validate `config` and bind it to a ledger and payer.
    pub fn new(ledger: L, wallet: Wallet, config: ProvisionConfig) -> Result<Self, ProvisionError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let amount = config.token.base_unit_supply().ok_or_else(|| {
            ConfigError::Validation(vec![ValidationError::new(
                "token.total_supply",
                "overflows a 64-bit base unit amount",
            )])
        })?;

        Ok(Self {
            ledger,
            wallet,
            config,
            amount,
        })
    }

    /// Run every step in order.
    pub async fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let funded = self.preflight().await?;
        let mint = self.create_mint(funded).await?;
        let metadata = self.attach_metadata(mint).await?;
        let account = self.ensure_token_account(metadata).await?;
        let minted = self.mint_supply(account).await?;
        self.revoke_authority(minted).await
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    pub fn payer(&self) -> Pubkey {
        self.wallet.pubkey()
    }

    fn commitment(&self) -> CommitmentConfig {
        self.config.rpc.commitment.into()
    }

    fn executor(&self) -> TxExecutor<'_, L> {
        TxExecutor::new(
            &self.ledger,
            self.commitment(),
            Duration::from_secs(self.config.rpc.confirm_timeout_secs),
            Duration::from_millis(self.config.rpc.poll_interval_ms),
        )
    }

    fn submit_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.retry.submit_attempts,
            Backoff::from(&self.config.retry),
        )
    }

    fn revoke_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.retry.revoke_attempts,
            Backoff::from(&self.config.retry),
        )
    }
}
