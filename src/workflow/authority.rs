//! Mint authority revocation and final state verification.

use solana_sdk::signature::Signer;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;

use crate::blockchain::client::Ledger;
use crate::blockchain::instructions;
use crate::observability::metrics;
use crate::workflow::{MintedSupply, ProvisionError, ProvisionReport, Provisioner, Step};

impl<L: Ledger> Provisioner<L> {
    /// Permanently clear the mint authority, then read the mint back to check it.
    ///
    /// Nothing is rolled back on failure: the supply has already been minted.
    pub async fn revoke_authority(&self, minted: MintedSupply) -> Result<ProvisionReport, ProvisionError> {
        tracing::info!(mint = %minted.mint().address(), "Removing mint authority");
        self.revoke_authority_inner(minted)
            .await
            .map_err(|e| ProvisionError::AuthorityRevocationFailed(Box::new(e)))
    }

    async fn revoke_authority_inner(&self, minted: MintedSupply) -> Result<ProvisionReport, ProvisionError> {
        let step = Step::AuthorityRevocation;
        let payer = self.wallet.keypair();
        let mint = minted.mint().address();

        let ix = instructions::revoke_mint_authority(&mint, &payer.pubkey())
            .map_err(ProvisionError::instruction(step))?;

        let outcome = self
            .executor()
            .execute(step.as_str(), &[ix], payer, &[], &self.revoke_policy())
            .await
            .map_err(|e| ProvisionError::from_execution(step, e))?;

        let account = self
            .ledger
            .get_account(&mint, self.commitment())
            .await
            .map_err(ProvisionError::connectivity(step))?
            .ok_or_else(|| ProvisionError::verification(step, "Mint account not found"))?;
        let state = Mint::unpack(&account.data)
            .map_err(|e| ProvisionError::verification(step, format!("Not a mint account: {}", e)))?;

        if state.mint_authority.is_some() {
            return Err(ProvisionError::verification(step, "Mint authority is still set"));
        }
        if state.supply != minted.amount() {
            return Err(ProvisionError::verification(
                step,
                format!(
                    "Mint supply is {} base units, expected {}",
                    state.supply,
                    minted.amount()
                ),
            ));
        }

        tracing::info!(signature = %outcome.signature, "Mint authority removed successfully");
        metrics::record_step_completed(step.as_str());

        Ok(ProvisionReport::new(
            &self.config.token,
            self.payer(),
            &minted,
            state.supply,
            outcome.signature,
        ))
    }
}
