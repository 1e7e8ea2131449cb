//! Stellar integration CLI
//!
//! Drives every operation of the integration layer against a live network
//! and prints the result as JSON.
//!
//! # Architecture Overview
//!
//! ```text
//!     CLI command
//!         │
//!         ▼
//!  ┌───────────────┐    ┌──────────────┐    ┌─────────────┐
//!  │ StellarService│───▶│ RetryExecutor│───▶│ RateLimiter │
//!  └───────────────┘    └──────────────┘    └──────┬──────┘
//!                                                  │
//!                              ┌───────────────────┴──────────┐
//!                              ▼                              ▼
//!                      ┌──────────────┐              ┌────────────────┐
//!                      │   Horizon    │              │  Soroban RPC   │
//!                      │ (REST, JSON) │              │ (JSON-RPC 2.0) │
//!                      └──────────────┘              └────────────────┘
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use stellar_integration::blockchain::{MonitorOptions, RawContractEvent};
use stellar_integration::config::load_config;
use stellar_integration::observability::{logging, metrics};
use stellar_integration::{Shutdown, StellarService};

#[derive(Parser)]
#[command(name = "stellar-integration")]
#[command(about = "Read-only Stellar/Soroban integration client", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the shape of an account (G...) or contract (C...) address
    Validate { address: String },
    /// Read token metadata from a token contract
    TokenInfo { contract: String },
    /// List burn events emitted by a token contract
    Burns { contract: String },
    /// Read the configured factory's registry state
    Factory,
    /// Read the configured factory's fee schedule
    FactoryFees,
    /// Read one token record from the configured factory
    FactoryToken { index: u32 },
    /// Fetch one transaction by hash
    Tx { hash: String },
    /// Poll a transaction until it is final
    Monitor {
        hash: String,
        #[arg(long)]
        attempts: Option<u32>,
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Decode a raw getEvents entry given as JSON
    ParseEvent { json: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };

    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let service = match StellarService::new(config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Startup error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(&service, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(service: &StellarService, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Validate { address } => print_json(&serde_json::json!({
            "address": address,
            "valid": service.validate_address(&address),
        })),
        Commands::TokenInfo { contract } => print_json(&service.get_token_info(&contract).await?),
        Commands::Burns { contract } => print_json(&service.get_burn_history(&contract).await?),
        Commands::Factory => print_json(&service.get_factory_state().await?),
        Commands::FactoryFees => print_json(&service.get_factory_fees().await?),
        Commands::FactoryToken { index } => print_json(&service.get_factory_token(index).await?),
        Commands::Tx { hash } => print_json(&service.get_transaction(&hash).await?),
        Commands::Monitor {
            hash,
            attempts,
            interval_ms,
        } => {
            let defaults = &service.config().monitor;
            let options = MonitorOptions::new(
                attempts.unwrap_or(defaults.max_attempts),
                Duration::from_millis(interval_ms.unwrap_or(defaults.poll_interval_ms)),
            );

            let shutdown = Arc::new(Shutdown::new());
            let cancel = shutdown.subscribe();
            shutdown.trigger_on_ctrl_c();

            print_json(&service.monitor_transaction_until(&hash, options, cancel).await)
        }
        Commands::ParseEvent { json } => {
            let raw: RawContractEvent = serde_json::from_str(&json)?;
            print_json(&service.parse_event(&raw)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
