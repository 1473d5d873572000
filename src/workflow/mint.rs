//! Mint creation, followed by an independent lookup and confirmation of its signature.

use solana_sdk::signature::{Keypair, Signer};

use crate::blockchain::client::Ledger;
use crate::blockchain::instructions::{self, MINT_ACCOUNT_LEN};
use crate::blockchain::types::BlockchainError;
use crate::observability::metrics;
use crate::workflow::{Funded, MintHandle, ProvisionError, Provisioner, Step};

impl<L: Ledger> Provisioner<L> {
    /// Create a new mint with the configured precision, the payer as mint authority and
    /// no freeze authority.
    pub async fn create_mint(&self, funded: Funded) -> Result<MintHandle, ProvisionError> {
        tracing::info!(balance = funded.balance(), "Creating token mint");
        self.create_mint_inner()
            .await
            .map_err(|e| ProvisionError::MintCreationFailed(Box::new(e)))
    }

    async fn create_mint_inner(&self) -> Result<MintHandle, ProvisionError> {
        let step = Step::MintCreation;
        let payer = self.wallet.keypair();
        let mint_keypair = Keypair::new();
        let mint = mint_keypair.pubkey();
        let decimals = self.config.token.decimals;

        let rent = self
            .ledger
            .get_minimum_balance_for_rent_exemption(MINT_ACCOUNT_LEN)
            .await
            .map_err(ProvisionError::connectivity(step))?;

        let ixs = instructions::create_mint(&payer.pubkey(), &mint, rent, decimals)
            .map_err(ProvisionError::instruction(step))?;

        let executor = self.executor();
        let outcome = executor
            .execute(step.as_str(), &ixs, payer, &[&mint_keypair], &self.submit_policy())
            .await
            .map_err(|e| ProvisionError::from_execution(step, e))?;

        // Re-confirm using the ledger's own record of the mint's latest signature.
        let signatures = self
            .ledger
            .get_signatures_for_address(&mint, 1, executor.commitment())
            .await
            .map_err(ProvisionError::connectivity(step))?;
        let signature = *signatures
            .first()
            .ok_or_else(|| ProvisionError::verification(step, "No signature found for mint creation"))?;

        if signature != outcome.signature {
            tracing::warn!(
                submitted = %outcome.signature,
                recorded = %signature,
                "Latest mint signature differs from the submitted one"
            );
        }

        executor
            .confirm(&signature, &outcome.blockhash)
            .await
            .map_err(|e| match e {
                e @ BlockchainError::OnChain { .. } => ProvisionError::OnChainLogic { step, source: e },
                last_error => ProvisionError::TransactionFailed {
                    step,
                    attempts: outcome.attempts,
                    last_error,
                },
            })?;

        tracing::info!(mint = %mint, decimals, signature = %signature, "Token mint created");
        metrics::record_step_completed(step.as_str());

        Ok(MintHandle {
            address: mint,
            signature,
            decimals,
        })
    }
}
