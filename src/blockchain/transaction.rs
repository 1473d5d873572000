//! Transaction building, signing, submission and confirmation monitoring.
//!
//! # Responsibilities
//! - Attach a fresh blockhash to every attempt
//! - Sign and submit transactions
//! - Poll for the requested commitment until the blockhash expires
//! - Retry transport failures; surface on-chain failures untouched

use std::time::Duration;

use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tokio::time::{interval, timeout};

use crate::blockchain::client::Ledger;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConfirmationStatus, LatestBlockhash,
};
use crate::observability::metrics;
use crate::resilience::{retry, RetryError, RetryPolicy};

/// A transaction observed at the requested commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub signature: Signature,
    /// Blockhash the successful attempt referenced.
    pub blockhash: LatestBlockhash,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Submits instructions and waits for them to reach a commitment level.
pub struct TxExecutor<'a, L> {
    ledger: &'a L,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl<'a, L: Ledger> TxExecutor<'a, L> {
    pub fn new(
        ledger: &'a L,
        commitment: CommitmentConfig,
        confirm_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            ledger,
            commitment,
            confirm_timeout,
            poll_interval,
        }
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Build, sign, submit and confirm `instructions`, retrying transport failures.
    ///
    /// `payer` pays fees and signs; `extra_signers` co-sign (e.g. a new account's keypair).
    /// Every attempt fetches its own blockhash. On-chain failures end the loop at once.
    pub async fn execute(
        &self,
        label: &'static str,
        instructions: &[Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
        policy: &RetryPolicy,
    ) -> Result<TransactionOutcome, RetryError<BlockchainError>> {
        retry(
            policy,
            label,
            move |attempt| async move {
                metrics::record_tx_attempt(label);
                let result = self.submit_once(instructions, payer, extra_signers).await;
                match &result {
                    Ok(outcome) => {
                        tracing::info!(op = label, signature = %outcome.signature, attempt, "Transaction confirmed");
                    }
                    Err(e) => {
                        metrics::record_tx_failure(label, e.kind());
                        tracing::warn!(op = label, attempt, max_attempts = policy.max_attempts, error = %e, "Transaction attempt failed");
                    }
                }
                result.map(|outcome| TransactionOutcome { attempts: attempt, ..outcome })
            },
            BlockchainError::is_transient,
        )
        .await
    }

    /// One attempt: fresh blockhash, sign, submit, confirm.
    pub async fn submit_once(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
    ) -> BlockchainResult<TransactionOutcome> {
        let blockhash = self.ledger.get_latest_blockhash(self.commitment).await?;

        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
        let mut signers: Vec<&Keypair> = Vec::with_capacity(1 + extra_signers.len());
        signers.push(payer);
        signers.extend_from_slice(extra_signers);
        transaction
            .try_sign(&signers, blockhash.hash)
            .map_err(|e| BlockchainError::Signing(e.to_string()))?;

        let signature = self.ledger.send_transaction(&transaction).await?;
        tracing::debug!(signature = %signature, last_valid_block_height = blockhash.last_valid_block_height, "Transaction submitted");

        self.confirm(&signature, &blockhash).await?;

        Ok(TransactionOutcome {
            signature,
            blockhash,
            attempts: 1,
        })
    }

    /// Wait until `signature` reaches the executor's commitment.
    ///
    /// Fails with `BlockhashExpired` once the chain passes the blockhash's last valid
    /// height (the transaction can no longer land), `OnChain` if the ledger reports the
    /// transaction failed, or `ConfirmationTimeout` after the configured deadline.
    /// Only `BlockhashExpired` allows a resubmission; after a timeout the outcome is unknown.
    /// Status lookups that fail transiently are logged and polled again.
    pub async fn confirm(
        &self,
        signature: &Signature,
        blockhash: &LatestBlockhash,
    ) -> BlockchainResult<()> {
        let result = timeout(self.confirm_timeout, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                match self.ledger.get_signature_status(signature, self.commitment).await {
                    Ok(ConfirmationStatus::Confirmed) => return Ok(()),
                    Ok(ConfirmationStatus::Failed(reason)) => {
                        return Err(BlockchainError::OnChain {
                            signature: *signature,
                            reason,
                        })
                    }
                    Ok(ConfirmationStatus::Pending) => {}
                    Err(e) if e.is_transient() => {
                        tracing::debug!(signature = %signature, error = %e, "Status lookup failed");
                        continue;
                    }
                    Err(e) => return Err(e),
                }

                match self.ledger.get_block_height(self.commitment).await {
                    Ok(height) if height > blockhash.last_valid_block_height => {
                        return Err(BlockchainError::BlockhashExpired {
                            last_valid_block_height: blockhash.last_valid_block_height,
                        });
                    }
                    Ok(height) => {
                        tracing::debug!(
                            signature = %signature,
                            block_height = height,
                            last_valid_block_height = blockhash.last_valid_block_height,
                            "Waiting for confirmation"
                        );
                    }
                    Err(e) => {
                        tracing::debug!(signature = %signature, error = %e, "Block height lookup failed");
                    }
                }
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout {
                signature: *signature,
                secs: self.confirm_timeout.as_secs(),
            }),
        }
    }
}
