//! Metadata attachment and read-after-write visibility polling.

use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;

use crate::blockchain::client::Ledger;
use crate::blockchain::instructions;
use crate::blockchain::types::BlockchainError;
use crate::observability::metrics;
use crate::resilience::{retry, RetryError, RetryPolicy};
use crate::workflow::{MetadataHandle, MintHandle, ProvisionError, Provisioner, Step};

/// Why a visibility lookup did not find the account yet.
#[derive(Debug)]
enum NotVisible {
    Missing,
    Lookup(BlockchainError),
}

impl std::fmt::Display for NotVisible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotVisible::Missing => write!(f, "account not found yet"),
            NotVisible::Lookup(e) => write!(f, "lookup failed: {}", e),
        }
    }
}

impl<L: Ledger> Provisioner<L> {
    /// Attach name, symbol and URI to the mint, then wait until the record is readable.
    pub async fn attach_metadata(&self, mint: MintHandle) -> Result<MetadataHandle, ProvisionError> {
        let step = Step::MetadataAttachment;
        tracing::info!(mint = %mint.address(), "Creating token metadata");

        self.check_balance(step, self.config.funding.metadata_lamports).await?;

        let payer = self.wallet.keypair();
        let address = instructions::metadata_address(&mint.address());
        let ix = instructions::create_metadata(&payer.pubkey(), &mint.address(), &self.config.token);

        let outcome = self
            .executor()
            .execute(step.as_str(), &[ix], payer, &[], &self.submit_policy())
            .await
            .map_err(|e| ProvisionError::from_execution(step, e))?;

        self.wait_until_visible(&address).await?;

        tracing::info!(metadata = %address, signature = %outcome.signature, "Metadata account verified");
        metrics::record_step_completed(step.as_str());

        Ok(MetadataHandle {
            mint,
            address,
            signature: outcome.signature,
        })
    }

    /// Poll for `address` until it exists, at most `metadata_poll_attempts` lookups
    /// spaced by the fixed retry delay.
    ///
    /// A confirmed transaction does not guarantee the account is readable yet.
    pub async fn wait_until_visible(&self, address: &Pubkey) -> Result<(), ProvisionError> {
        let policy = RetryPolicy::fixed(
            self.config.retry.metadata_poll_attempts,
            Duration::from_millis(self.config.retry.delay_ms),
        );
        let commitment = self.commitment();

        let result = retry(
            &policy,
            "metadata_visibility",
            move |attempt| async move {
                match self.ledger.get_account(address, commitment).await {
                    Ok(Some(_)) => Ok(()),
                    Ok(None) => {
                        tracing::info!(attempt, metadata = %address, "Waiting for metadata account...");
                        Err(NotVisible::Missing)
                    }
                    Err(e) => {
                        tracing::info!(attempt, metadata = %address, error = %e, "Waiting for metadata account...");
                        Err(NotVisible::Lookup(e))
                    }
                }
            },
            |_| true,
        )
        .await;

        result.map_err(|e| {
            let attempts = match e {
                RetryError::Exhausted { attempts, .. } => attempts,
                RetryError::Fatal(_) => 1,
            };
            ProvisionError::MetadataVerificationFailed {
                address: *address,
                attempts,
            }
        })
    }
}
