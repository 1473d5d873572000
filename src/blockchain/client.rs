//! Ledger RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Define the request/response contract the workflow needs (`Ledger`)
//! - Connect to one or more JSON-RPC endpoints
//! - Query chain state (balances, blockhashes, accounts, signature statuses)
//! - Submit signed transactions
//! - Handle timeouts and network errors gracefully

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};
use tokio::time::timeout;
use url::Url;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConfirmationStatus, LatestBlockhash,
};
use crate::config::loader::redact_endpoint;

/// The remote ledger operations a provisioning run depends on.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Balance of `address` in lamports.
    async fn get_balance(&self, address: &Pubkey) -> BlockchainResult<u64>;

    /// Most recent blockhash at `commitment`, with its expiry height.
    async fn get_latest_blockhash(
        &self,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<LatestBlockhash>;

    /// Current block height at `commitment`.
    async fn get_block_height(&self, commitment: CommitmentConfig) -> BlockchainResult<u64>;

    /// Lamports needed for an account of `data_len` bytes to be rent exempt.
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> BlockchainResult<u64>;

    /// Submit a signed transaction. Returns once the node accepted it, not once it is confirmed.
    async fn send_transaction(&self, transaction: &Transaction) -> BlockchainResult<Signature>;

    /// Status of `signature` at `commitment`.
    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<ConfirmationStatus>;

    /// Account stored at `address`, if any.
    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<Option<Account>>;

    /// Newest signatures that touched `address`, most recent first.
    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<Vec<Signature>>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    async fn get_balance(&self, address: &Pubkey) -> BlockchainResult<u64> {
        (**self).get_balance(address).await
    }

    async fn get_latest_blockhash(
        &self,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<LatestBlockhash> {
        (**self).get_latest_blockhash(commitment).await
    }

    async fn get_block_height(&self, commitment: CommitmentConfig) -> BlockchainResult<u64> {
        (**self).get_block_height(commitment).await
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> BlockchainResult<u64> {
        (**self).get_minimum_balance_for_rent_exemption(data_len).await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> BlockchainResult<Signature> {
        (**self).send_transaction(transaction).await
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<ConfirmationStatus> {
        (**self).get_signature_status(signature, commitment).await
    }

    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<Option<Account>> {
        (**self).get_account(address, commitment).await
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<Vec<Signature>> {
        (**self).get_signatures_for_address(address, limit, commitment).await
    }
}

/// JSON-RPC ledger client with failover support.
#[derive(Clone)]
pub struct RpcLedger {
    /// Clients (primary first, then failovers), paired with a log-safe endpoint label.
    clients: Vec<(Arc<RpcClient>, String)>,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcLedger {
    /// Create a client over `endpoints` (primary first).
    ///
    /// No network call is made here; use `Ledger::get_latest_blockhash` to probe connectivity.
    pub fn new(endpoints: &[Url], commitment: CommitmentConfig, timeout_secs: u64) -> Self {
        let timeout_duration = Duration::from_secs(timeout_secs);
        let clients = endpoints
            .iter()
            .map(|url| {
                let client = RpcClient::new_with_timeout_and_commitment(
                    url.to_string(),
                    timeout_duration,
                    commitment,
                );
                (Arc::new(client), redact_endpoint(url))
            })
            .collect::<Vec<_>>();

        tracing::info!(
            endpoints = clients.len(),
            primary = %clients.first().map(|(_, label)| label.as_str()).unwrap_or("<none>"),
            "Ledger client initialized"
        );

        Self {
            clients,
            timeout_duration,
        }
    }

    /// Run `call` against each endpoint in turn until one answers.
    ///
    /// Non-transient errors are returned straight away; another endpoint would give the same answer.
    async fn call<T, F, Fut>(&self, op: &'static str, call: F) -> BlockchainResult<T>
    where
        F: Fn(Arc<RpcClient>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut last_error = None;
        for (i, (client, label)) in self.clients.iter().enumerate() {
            match timeout(self.timeout_duration, call(client.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    let err = classify_client_error(e);
                    if !err.is_transient() {
                        return Err(err);
                    }
                    tracing::warn!(op, provider_idx = i, endpoint = %label, error = %err, "RPC error, trying next provider");
                    last_error = Some(err);
                }
                Err(_) => {
                    tracing::warn!(op, provider_idx = i, endpoint = %label, "RPC timeout, trying next provider");
                    last_error = Some(BlockchainError::Timeout(self.timeout_duration.as_secs()));
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| BlockchainError::Rpc(format!("No RPC endpoints configured for {}", op))))
    }
}

/// Map a client error to a ledger error, separating logical rejections from transport trouble.
fn classify_client_error(err: ClientError) -> BlockchainError {
    match err.get_transaction_error() {
        Some(TransactionError::BlockhashNotFound) => {
            BlockchainError::BlockhashExpired { last_valid_block_height: 0 }
        }
        Some(tx_err) => BlockchainError::Rejected(tx_err.to_string()),
        None => BlockchainError::Rpc(err.to_string()),
    }
}

impl Ledger for RpcLedger {
    async fn get_balance(&self, address: &Pubkey) -> BlockchainResult<u64> {
        let address = *address;
        self.call("get_balance", move |c| async move { c.get_balance(&address).await })
            .await
    }

    async fn get_latest_blockhash(
        &self,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<LatestBlockhash> {
        let (hash, last_valid_block_height) = self
            .call("get_latest_blockhash", move |c| async move {
                c.get_latest_blockhash_with_commitment(commitment).await
            })
            .await?;
        Ok(LatestBlockhash {
            hash,
            last_valid_block_height,
        })
    }

    async fn get_block_height(&self, commitment: CommitmentConfig) -> BlockchainResult<u64> {
        self.call("get_block_height", move |c| async move {
            c.get_block_height_with_commitment(commitment).await
        })
        .await
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> BlockchainResult<u64> {
        self.call("get_minimum_balance_for_rent_exemption", move |c| async move {
            c.get_minimum_balance_for_rent_exemption(data_len).await
        })
        .await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> BlockchainResult<Signature> {
        self.call("send_transaction", |c| {
            let transaction = transaction.clone();
            let config = RpcSendTransactionConfig {
                skip_preflight: false,
                max_retries: Some(5),
                ..RpcSendTransactionConfig::default()
            };
            async move { c.send_transaction_with_config(&transaction, config).await }
        })
        .await
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<ConfirmationStatus> {
        let signature = *signature;
        let status = self
            .call("get_signature_status", move |c| async move {
                c.get_signature_status_with_commitment(&signature, commitment).await
            })
            .await?;
        Ok(match status {
            None => ConfirmationStatus::Pending,
            Some(Ok(())) => ConfirmationStatus::Confirmed,
            Some(Err(e)) => ConfirmationStatus::Failed(e),
        })
    }

    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<Option<Account>> {
        let address = *address;
        let response = self
            .call("get_account", move |c| async move {
                c.get_account_with_commitment(&address, commitment).await
            })
            .await?;
        Ok(response.value)
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
        commitment: CommitmentConfig,
    ) -> BlockchainResult<Vec<Signature>> {
        let address = *address;
        let statuses = self
            .call("get_signatures_for_address", move |c| async move {
                let config = GetConfirmedSignaturesForAddress2Config {
                    before: None,
                    until: None,
                    limit: Some(limit),
                    commitment: Some(commitment),
                };
                c.get_signatures_for_address_with_config(&address, config).await
            })
            .await?;

        statuses
            .iter()
            .map(|status| {
                Signature::from_str(&status.signature).map_err(|e| {
                    BlockchainError::Rpc(format!("Malformed signature '{}': {}", status.signature, e))
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field(
                "endpoints",
                &self.clients.iter().map(|(_, label)| label.as_str()).collect::<Vec<_>>(),
            )
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
