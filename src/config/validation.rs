//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (decimals, supply, attempt counts)
//! - Validate endpoint URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProvisionConfig → Result<(), Vec<ValidationError>>
//! - Runs before any network call is made

use crate::config::schema::ProvisionConfig;

/// Highest decimal precision accepted for a mint.
pub const MAX_DECIMALS: u8 = 18;

/// Longest name accepted by the metadata program.
pub const MAX_NAME_LEN: usize = 32;

/// Longest symbol accepted by the metadata program.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Longest URI accepted by the metadata program.
pub const MAX_URI_LEN: usize = 200;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `token.decimals`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProvisionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let token = &config.token;

    if token.decimals > MAX_DECIMALS {
        errors.push(ValidationError::new(
            "token.decimals",
            format!("{} is outside 0..={}", token.decimals, MAX_DECIMALS),
        ));
    }
    if token.total_supply == 0 {
        errors.push(ValidationError::new("token.total_supply", "must be greater than zero"));
    } else if token.decimals <= MAX_DECIMALS && token.base_unit_supply().is_none() {
        errors.push(ValidationError::new(
            "token.total_supply",
            format!(
                "{} tokens at {} decimals overflows a 64-bit base unit amount",
                token.total_supply, token.decimals
            ),
        ));
    }

    if token.name.trim().is_empty() {
        errors.push(ValidationError::new("token.name", "must not be empty"));
    } else if token.name.len() > MAX_NAME_LEN {
        errors.push(ValidationError::new(
            "token.name",
            format!("longer than {} bytes", MAX_NAME_LEN),
        ));
    }
    if token.symbol.trim().is_empty() {
        errors.push(ValidationError::new("token.symbol", "must not be empty"));
    } else if token.symbol.len() > MAX_SYMBOL_LEN {
        errors.push(ValidationError::new(
            "token.symbol",
            format!("longer than {} bytes", MAX_SYMBOL_LEN),
        ));
    }
    if token.uri.len() > MAX_URI_LEN {
        errors.push(ValidationError::new(
            "token.uri",
            format!("longer than {} bytes", MAX_URI_LEN),
        ));
    }

    if let Err(message) = check_http_url(&config.rpc.url) {
        errors.push(ValidationError::new("rpc.url", message));
    }
    for failover in &config.rpc.failover_urls {
        if let Err(message) = check_http_url(failover) {
            errors.push(ValidationError::new(
                "rpc.failover_urls",
                format!("'{}': {}", failover, message),
            ));
        }
    }
    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be greater than zero"));
    }
    if config.rpc.confirm_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "rpc.confirm_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.rpc.poll_interval_ms == 0 {
        errors.push(ValidationError::new("rpc.poll_interval_ms", "must be greater than zero"));
    }

    let retry = &config.retry;
    for (field, value) in [
        ("retry.submit_attempts", retry.submit_attempts),
        ("retry.revoke_attempts", retry.revoke_attempts),
        ("retry.metadata_poll_attempts", retry.metadata_poll_attempts),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be at least 1"));
        }
    }

    if config.funding.metadata_lamports > config.funding.min_total_lamports {
        errors.push(ValidationError::new(
            "funding.metadata_lamports",
            "must not exceed funding.min_total_lamports",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// RPC endpoints must be plain http(s); the websocket URL is derived from them.
fn check_http_url(raw: &str) -> Result<(), String> {
    let url = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}', expected http or https", other)),
    }
}
