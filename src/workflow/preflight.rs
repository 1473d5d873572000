//! Preflight: connectivity and funding checks made before anything is submitted.

use solana_sdk::native_token::lamports_to_sol;

use crate::blockchain::client::Ledger;
use crate::blockchain::types::LatestBlockhash;
use crate::observability::metrics;
use crate::workflow::{Funded, ProvisionError, Provisioner, Step};

impl<L: Ledger> Provisioner<L> {
    /// Probe the endpoint, report the configuration and check the aggregate balance.
    pub async fn preflight(&self) -> Result<Funded, ProvisionError> {
        let step = Step::Preflight;
        self.check_connectivity(step).await?;

        let token = &self.config.token;
        tracing::info!(
            payer = %self.payer(),
            name = %token.name,
            symbol = %token.symbol,
            decimals = token.decimals,
            total_supply = token.total_supply,
            description = %token.description,
            "Token configuration"
        );

        let balance = self
            .check_balance(step, self.config.funding.min_total_lamports)
            .await?;

        metrics::record_step_completed(step.as_str());
        Ok(Funded { balance })
    }

    /// Fetch a blockhash to prove the endpoint answers.
    pub async fn check_connectivity(&self, step: Step) -> Result<LatestBlockhash, ProvisionError> {
        self.ledger
            .get_latest_blockhash(self.commitment())
            .await
            .map_err(ProvisionError::connectivity(step))
    }

    /// Fail with `InsufficientFunds` unless the payer holds at least `required` lamports.
    ///
    /// A failed balance query is a connectivity problem and is not retried.
    pub async fn check_balance(&self, step: Step, required: u64) -> Result<u64, ProvisionError> {
        let balance = self
            .ledger
            .get_balance(&self.payer())
            .await
            .map_err(ProvisionError::connectivity(step))?;

        tracing::info!(
            step = step.as_str(),
            balance_sol = lamports_to_sol(balance),
            required_sol = lamports_to_sol(required),
            "Wallet balance"
        );

        if balance < required {
            return Err(ProvisionError::InsufficientFunds {
                step,
                balance,
                required,
            });
        }
        Ok(balance)
    }
}
