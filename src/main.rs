//! token-provision
//!
//! One-shot provisioning of a fungible token.
//!
//! # Flow
//!
//! ```text
//!   .env / environment / --config file
//!              │
//!              ▼
//!   ┌─────────────────────┐     ┌──────────────────────────────────────────┐
//!   │ config + wallet     │────▶│ Provisioner                              │
//!   └─────────────────────┘     │  preflight → mint → metadata →           │
//!                               │  token account → mint supply → revoke    │
//!                               └───────────────────┬──────────────────────┘
//!                                                   │ TxExecutor
//!                                                   ▼ (blockhash, sign, send, confirm, retry)
//!                                          ┌─────────────────┐
//!                                          │ RpcLedger       │──▶ RPC endpoint(s)
//!                                          └─────────────────┘
//! ```
//!
//! Exit status is 0 on success and non-zero on any error. A failed run is not
//! rolled back; inspect the printed addresses before running again.

use std::path::PathBuf;

use clap::Parser;

use token_provision::blockchain::{RpcLedger, Wallet};
use token_provision::config::loader::{load_config, redact_endpoint, rpc_endpoints, ws_endpoint, ConfigError};
use token_provision::observability::logging::init_logging;
use token_provision::workflow::{ProvisionError, Provisioner, Step};

#[derive(Parser)]
#[command(name = "token-provision")]
#[command(about = "Create a fungible token with metadata, mint its supply and revoke minting", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RPC endpoint, overriding RPC_URL and the config file.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Only run preflight checks; submit nothing.
    #[arg(long)]
    check: bool,

    /// Print the final report as JSON.
    #[arg(long)]
    json: bool,

    /// Debug-level logging when RUST_LOG is unset.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();
    init_logging(cli.verbose);

    tracing::info!("token-provision v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, step = e.step().map(|s| s.as_str()), "Provisioning failed");
        // Each error's Display already includes its causes.
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), ProvisionError> {
    let rpc_override = cli.rpc_url.clone();
    let config = load_config(cli.config.as_deref(), |key| match key {
        "RPC_URL" if rpc_override.is_some() => rpc_override.clone(),
        _ => std::env::var(key).ok(),
    })?;

    // Credential problems must surface before any network call.
    let wallet = Wallet::from_env(|key| std::env::var(key).ok()).map_err(ConfigError::Credential)?;
    tracing::info!(wallet = %wallet.pubkey(), "Using wallet");

    let endpoints = rpc_endpoints(&config.rpc)?;
    if let Some(primary) = endpoints.first() {
        tracing::info!(
            rpc = %redact_endpoint(primary),
            ws = %ws_endpoint(primary).map(|ws| redact_endpoint(&ws)).unwrap_or_default(),
            commitment = ?config.rpc.commitment,
            "Connecting"
        );
    }
    let ledger = RpcLedger::new(&endpoints, config.rpc.commitment.into(), config.rpc.timeout_secs);

    let json = cli.json;
    let provisioner = Provisioner::new(ledger, wallet, config)?;

    if cli.check {
        let funded = provisioner.preflight().await?;
        tracing::info!(step = Step::Preflight.as_str(), balance = funded.balance(), "Preflight passed; nothing submitted");
        return Ok(());
    }

    let report = provisioner.run().await?;
    if json {
        println!("{}", report.to_json());
    } else {
        println!("{}", report);
    }
    Ok(())
}
