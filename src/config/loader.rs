//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{Network, StellarConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value } => {
                write!(f, "Invalid value '{}' for environment variable {}", value, key)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub const ENV_NETWORK: &str = "STELLAR_NETWORK";
pub const ENV_HORIZON_URL: &str = "STELLAR_HORIZON_URL";
pub const ENV_SOROBAN_RPC_URL: &str = "STELLAR_SOROBAN_RPC_URL";
pub const ENV_FACTORY_CONTRACT_ID: &str = "STELLAR_FACTORY_CONTRACT_ID";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "STELLAR_REQUEST_TIMEOUT_MS";
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "STELLAR_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_INITIAL_DELAY_MS: &str = "STELLAR_RETRY_INITIAL_DELAY_MS";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "STELLAR_RETRY_MAX_DELAY_MS";
pub const ENV_RETRY_BACKOFF_FACTOR: &str = "STELLAR_RETRY_BACKOFF_FACTOR";
pub const ENV_RATE_LIMIT_MAX_REQUESTS: &str = "STELLAR_RATE_LIMIT_MAX_REQUESTS";
pub const ENV_RATE_LIMIT_WINDOW_MS: &str = "STELLAR_RATE_LIMIT_WINDOW_MS";
pub const ENV_SIMULATION_SOURCE: &str = "STELLAR_SIMULATION_SOURCE";

fn parsed<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}

/// Non-empty value of `key`, if set.
fn lookup<F>(env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(key).filter(|v| !v.trim().is_empty())
}

/// Overlay environment-provided settings on `config`.
///
/// `env` resolves a variable name; production passes `std::env::var`.
pub fn apply_env_overrides<F>(config: &mut StellarConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(&env, ENV_NETWORK) {
        config.network = Network::from_str(&v).map_err(|_| ConfigError::Env {
            key: ENV_NETWORK,
            value: v,
        })?;
    }
    if let Some(v) = lookup(&env, ENV_HORIZON_URL) {
        config.horizon_url = Some(v);
    }
    if let Some(v) = lookup(&env, ENV_SOROBAN_RPC_URL) {
        config.soroban_rpc_url = Some(v);
    }
    if let Some(v) = lookup(&env, ENV_FACTORY_CONTRACT_ID) {
        config.factory_contract_id = Some(v.trim().to_string());
    }
    if let Some(v) = lookup(&env, ENV_SIMULATION_SOURCE) {
        config.simulation_source = Some(v.trim().to_string());
    }
    if let Some(v) = lookup(&env, ENV_REQUEST_TIMEOUT_MS) {
        config.request_timeout_ms = parsed(ENV_REQUEST_TIMEOUT_MS, v)?;
    }
    if let Some(v) = lookup(&env, ENV_RETRY_MAX_ATTEMPTS) {
        config.retry.max_attempts = parsed(ENV_RETRY_MAX_ATTEMPTS, v)?;
    }
    if let Some(v) = lookup(&env, ENV_RETRY_INITIAL_DELAY_MS) {
        config.retry.initial_delay_ms = parsed(ENV_RETRY_INITIAL_DELAY_MS, v)?;
    }
    if let Some(v) = lookup(&env, ENV_RETRY_MAX_DELAY_MS) {
        config.retry.max_delay_ms = parsed(ENV_RETRY_MAX_DELAY_MS, v)?;
    }
    if let Some(v) = lookup(&env, ENV_RETRY_BACKOFF_FACTOR) {
        config.retry.backoff_factor = parsed(ENV_RETRY_BACKOFF_FACTOR, v)?;
    }
    if let Some(v) = lookup(&env, ENV_RATE_LIMIT_MAX_REQUESTS) {
        config.rate_limit.max_requests = parsed(ENV_RATE_LIMIT_MAX_REQUESTS, v)?;
    }
    if let Some(v) = lookup(&env, ENV_RATE_LIMIT_WINDOW_MS) {
        config.rate_limit.window_ms = parsed(ENV_RATE_LIMIT_WINDOW_MS, v)?;
    }
    Ok(())
}

/// Parse TOML text into a config, without environment or validation.
pub fn parse_config(content: &str) -> Result<StellarConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Load configuration: optional TOML file, then environment, then validation.
pub fn load_config(path: Option<&Path>) -> Result<StellarConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            parse_config(&content)?
        }
        None => StellarConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
