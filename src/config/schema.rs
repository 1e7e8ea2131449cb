//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! integration client. All types derive Serde traits for deserialization
//! from config files; every section falls back to its defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration for the Stellar integration layer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StellarConfig {
    /// Which public network to talk to.
    pub network: Network,

    /// Horizon (classic ledger API) base URL. `None` = network default.
    pub horizon_url: Option<String>,

    /// Soroban RPC (contract simulation/query) URL. `None` = network default.
    pub soroban_rpc_url: Option<String>,

    /// Token factory contract identity (`C...`), if deployed.
    pub factory_contract_id: Option<String>,

    /// Per-attempt deadline in milliseconds.
    pub request_timeout_ms: u64,

    /// Retry policy for every RPC operation.
    pub retry: RetryPolicy,

    /// Outbound request budget.
    pub rate_limit: RateLimitPolicy,

    /// Source account placed on simulation envelopes (`G...`).
    /// `None` uses the all-zero placeholder account.
    pub simulation_source: Option<String>,

    /// Event query settings.
    pub events: EventQueryConfig,

    /// Defaults for transaction monitoring.
    pub monitor: MonitorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for StellarConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            horizon_url: None,
            soroban_rpc_url: None,
            factory_contract_id: None,
            request_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            rate_limit: RateLimitPolicy::default(),
            simulation_source: None,
            events: EventQueryConfig::default(),
            monitor: MonitorConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl StellarConfig {
    pub fn horizon_url(&self) -> &str {
        self.horizon_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_horizon_url())
    }

    pub fn soroban_rpc_url(&self) -> &str {
        self.soroban_rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_soroban_rpc_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Stellar public network selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Mainnet => "https://horizon.stellar.org",
        }
    }

    pub fn default_soroban_rpc_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://soroban-testnet.stellar.org",
            Network::Mainnet => "https://mainnet.sorobanrpc.com",
        }
    }

    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Mainnet => "Public Global Stellar Network ; September 2015",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" | "test" => Ok(Network::Testnet),
            "mainnet" | "main" | "public" => Ok(Network::Mainnet),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds.
    pub max_delay_ms: u64,

    /// Multiplier applied per retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    /// Maximum requests admitted per window.
    pub max_requests: usize,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_ms: 60_000,
        }
    }
}

/// Contract event query configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventQueryConfig {
    /// First ledger scanned by history queries.
    pub start_ledger: u32,

    /// Events requested per page.
    pub page_limit: u32,

    /// Pages followed before giving up on a history query.
    pub max_pages: u32,
}

impl Default for EventQueryConfig {
    fn default() -> Self {
        Self {
            start_ledger: 1,
            page_limit: 100,
            max_pages: 10,
        }
    }
}

/// Transaction monitoring defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
