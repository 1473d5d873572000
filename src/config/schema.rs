//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a provisioning run.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a provisioning run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Token parameters (name, symbol, precision, supply).
    pub token: TokenConfig,

    /// RPC endpoint settings.
    pub rpc: RpcConfig,

    /// Retry and polling settings.
    pub retry: RetryConfig,

    /// Balance thresholds checked before submitting anything.
    pub funding: FundingConfig,
}

/// Token parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Human-readable token name stored in the metadata record.
    pub name: String,

    /// Ticker symbol stored in the metadata record.
    pub symbol: String,

    /// Free-form description. Reported only, not stored on the ledger.
    pub description: String,

    /// Decimal precision of the mint (0-18).
    pub decimals: u8,

    /// Total supply in whole tokens. Scaled by `10^decimals` when minted.
    pub total_supply: u64,

    /// Off-chain metadata URI (may be empty).
    pub uri: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "My Token".to_string(),
            symbol: "MTK".to_string(),
            description: "My custom token on Solana".to_string(),
            decimals: 9,
            total_supply: 1_000_000_000,
            uri: String::new(),
        }
    }
}

impl TokenConfig {
    /// Supply expressed in base units, or `None` if it does not fit in a `u64`.
    pub fn base_unit_supply(&self) -> Option<u64> {
        10u64
            .checked_pow(self.decimals as u32)
            .and_then(|scale| self.total_supply.checked_mul(scale))
    }
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// API key appended as the `api-key` query parameter, if set.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Commitment level used for reads and confirmations.
    pub commitment: Commitment,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Upper bound on waiting for a single confirmation, in seconds.
    pub confirm_timeout_secs: u64,

    /// Interval between signature status polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://mainnet.helius-rpc.com/".to_string(),
            failover_urls: Vec::new(),
            api_key: None,
            commitment: Commitment::Finalized,
            timeout_secs: 30,
            confirm_timeout_secs: 60,
            poll_interval_ms: 500,
        }
    }
}

/// Commitment level requested for reads and confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Same delay before every retry.
    Fixed,
    /// Delay doubles per attempt, capped at `max_delay_ms`, with jitter.
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts for ordinary transaction submission.
    pub submit_attempts: u32,

    /// Attempts for the mint authority revocation.
    pub revoke_attempts: u32,

    /// Delay between attempts in milliseconds.
    pub delay_ms: u64,

    /// How the delay evolves between attempts.
    pub strategy: BackoffStrategy,

    /// Cap for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Lookups made while waiting for the metadata account to appear.
    pub metadata_poll_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            submit_attempts: 5,
            revoke_attempts: 3,
            delay_ms: 2000,
            strategy: BackoffStrategy::Fixed,
            max_delay_ms: 10_000,
            metadata_poll_attempts: 5,
        }
    }
}

/// Balance thresholds in lamports.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FundingConfig {
    /// Required before the run starts. Covers all five steps.
    pub min_total_lamports: u64,

    /// Required right before the metadata account is created.
    pub metadata_lamports: u64,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            min_total_lamports: 18_000_000,
            metadata_lamports: 15_200_000,
        }
    }
}
