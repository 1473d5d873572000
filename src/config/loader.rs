//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use url::Url;

use crate::blockchain::types::BlockchainError;
use crate::config::schema::{ProvisionConfig, RpcConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Credential(BlockchainError),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Credential(e) => write!(f, "Signing credential unusable: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Credential(e) => Some(e),
            _ => None,
        }
    }
}

/// Load configuration: defaults, then the optional TOML file, then environment
/// overrides, then validation.
///
/// `env` is the environment lookup. The binary passes `std::env::var`; tests pass a map.
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<ProvisionConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ProvisionConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay recognised environment variables onto `config`.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut ProvisionConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| env(var).filter(|v| !v.trim().is_empty());

    if let Some(name) = get("TOKEN_NAME") {
        config.token.name = name;
    }
    if let Some(symbol) = get("TOKEN_SYMBOL") {
        config.token.symbol = symbol;
    }
    if let Some(description) = get("TOKEN_DESCRIPTION") {
        config.token.description = description;
    }
    if let Some(decimals) = get("TOKEN_DECIMALS") {
        config.token.decimals = parse_var("TOKEN_DECIMALS", &decimals)?;
    }
    if let Some(supply) = get("TOKEN_SUPPLY") {
        config.token.total_supply = parse_var("TOKEN_SUPPLY", &supply)?;
    }
    if let Some(uri) = get("TOKEN_URI") {
        config.token.uri = uri;
    }
    if let Some(url) = get("RPC_URL") {
        config.rpc.url = url;
    }
    if let Some(api_key) = get("HELIUS_API_KEY") {
        config.rpc.api_key = Some(api_key);
    }

    Ok(())
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        message: format!("'{}': {}", value, e),
    })
}

/// Resolve the primary and failover HTTP endpoints, with the API key attached.
pub fn rpc_endpoints(rpc: &RpcConfig) -> Result<Vec<Url>, ConfigError> {
    std::iter::once(&rpc.url)
        .chain(rpc.failover_urls.iter())
        .map(|raw| {
            let mut url = Url::parse(raw).map_err(|e| ConfigError::Env {
                var: "RPC_URL",
                message: format!("'{}': {}", raw, e),
            })?;
            if let Some(key) = &rpc.api_key {
                url.query_pairs_mut().append_pair("api-key", key);
            }
            Ok(url)
        })
        .collect()
}

/// Websocket endpoint paired with an HTTP endpoint (`https` → `wss`, `http` → `ws`).
///
/// Returns `None` for any other scheme; validation only admits http(s) endpoints.
pub fn ws_endpoint(http: &Url) -> Option<Url> {
    let scheme = match http.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return None,
    };
    let mut ws = http.clone();
    ws.set_scheme(scheme).ok()?;
    Some(ws)
}

/// Log-safe rendering of an endpoint: the query string (which carries the API key) is dropped.
pub fn redact_endpoint(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
