//! Holding account creation and the one-shot supply mint.

use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use spl_token::solana_program::program_pack::Pack;

use crate::blockchain::client::Ledger;
use crate::blockchain::instructions;
use crate::observability::metrics;
use crate::workflow::{
    MetadataHandle, MintedSupply, ProvisionError, Provisioner, Step, TokenAccountHandle,
};

impl<L: Ledger> Provisioner<L> {
    /// Ensure the payer's holding account for the mint exists, creating it if absent.
    pub async fn ensure_token_account(
        &self,
        metadata: MetadataHandle,
    ) -> Result<TokenAccountHandle, ProvisionError> {
        tracing::info!("Creating token account");
        self.ensure_token_account_inner(metadata)
            .await
            .map_err(|e| ProvisionError::TokenAccountFailed(Box::new(e)))
    }

    async fn ensure_token_account_inner(
        &self,
        metadata: MetadataHandle,
    ) -> Result<TokenAccountHandle, ProvisionError> {
        let step = Step::TokenAccount;
        let payer = self.wallet.keypair();
        let owner = payer.pubkey();
        let mint = metadata.mint().address();
        let address = instructions::token_account_address(&owner, &mint);

        let existing = self
            .ledger
            .get_account(&address, self.commitment())
            .await
            .map_err(ProvisionError::connectivity(step))?;

        let signature = match existing {
            Some(account) => {
                check_token_account(step, &account, &mint, &owner)?;
                tracing::info!(account = %address, "Reusing existing token account");
                None
            }
            None => {
                let ix = instructions::create_token_account(&owner, &owner, &mint);
                let outcome = self
                    .executor()
                    .execute(step.as_str(), &[ix], payer, &[], &self.submit_policy())
                    .await
                    .map_err(|e| ProvisionError::from_execution(step, e))?;
                Some(outcome.signature)
            }
        };

        // Single read-back; creation was already confirmed at the requested commitment.
        let account = self
            .ledger
            .get_account(&address, self.commitment())
            .await
            .map_err(ProvisionError::connectivity(step))?
            .ok_or_else(|| ProvisionError::verification(step, "Token account not found after creation"))?;
        check_token_account(step, &account, &mint, &owner)?;

        tracing::info!(account = %address, "Token account ready");
        metrics::record_step_completed(step.as_str());

        Ok(TokenAccountHandle {
            metadata,
            address,
            signature,
        })
    }

    /// Credit the whole configured supply to the holding account in one instruction.
    pub async fn mint_supply(&self, account: TokenAccountHandle) -> Result<MintedSupply, ProvisionError> {
        tracing::info!(amount = self.amount, "Minting tokens");
        self.mint_supply_inner(account)
            .await
            .map_err(|e| ProvisionError::MintingFailed(Box::new(e)))
    }

    async fn mint_supply_inner(&self, account: TokenAccountHandle) -> Result<MintedSupply, ProvisionError> {
        let step = Step::Minting;
        let payer = self.wallet.keypair();
        let ix = instructions::mint_to(
            &account.mint().address(),
            &account.address(),
            &payer.pubkey(),
            self.amount,
        )
        .map_err(ProvisionError::instruction(step))?;

        let outcome = self
            .executor()
            .execute(step.as_str(), &[ix], payer, &[], &self.submit_policy())
            .await
            .map_err(|e| ProvisionError::from_execution(step, e))?;

        tracing::info!(amount = self.amount, signature = %outcome.signature, "Supply minted");
        metrics::record_step_completed(step.as_str());

        Ok(MintedSupply {
            account,
            amount: self.amount,
            signature: outcome.signature,
        })
    }
}

/// The account must be a token account of `mint` owned by `owner`.
fn check_token_account(
    step: Step,
    account: &Account,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<(), ProvisionError> {
    if account.owner != spl_token::id() {
        return Err(ProvisionError::verification(
            step,
            format!("Account is owned by {}, not the token program", account.owner),
        ));
    }
    let state = spl_token::state::Account::unpack(&account.data)
        .map_err(|e| ProvisionError::verification(step, format!("Not a token account: {}", e)))?;
    if state.mint != *mint || state.owner != *owner {
        return Err(ProvisionError::verification(
            step,
            format!("Token account belongs to mint {} / owner {}", state.mint, state.owner),
        ));
    }
    Ok(())
}
