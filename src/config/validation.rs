//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, backoff factor ≥ 1)
//! - Check that configured identities have the right address kind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StellarConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::blockchain::address::{is_account_address, is_contract_address};
use crate::config::schema::StellarConfig;

/// One rejected setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &StellarConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("horizon_url", config.horizon_url()),
        ("soroban_rpc_url", config.soroban_rpc_url()),
    ] {
        match url::Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                field,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
        }
    }

    if let Some(id) = &config.factory_contract_id {
        if !is_contract_address(id) {
            errors.push(ValidationError::new(
                "factory_contract_id",
                format!("'{}' is not a contract address", id),
            ));
        }
    }

    if let Some(source) = &config.simulation_source {
        if !is_account_address(source) {
            errors.push(ValidationError::new(
                "simulation_source",
                format!("'{}' is not an account address", source),
            ));
        }
    }

    if config.request_timeout_ms == 0 {
        errors.push(ValidationError::new("request_timeout_ms", "must be greater than 0"));
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be at least 1"));
    }
    if !(retry.backoff_factor >= 1.0 && retry.backoff_factor.is_finite()) {
        errors.push(ValidationError::new(
            "retry.backoff_factor",
            "must be a finite number ≥ 1",
        ));
    }
    if retry.initial_delay_ms > retry.max_delay_ms {
        errors.push(ValidationError::new(
            "retry.initial_delay_ms",
            "must not exceed retry.max_delay_ms",
        ));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be at least 1"));
    }
    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }

    if !(1..=10_000).contains(&config.events.page_limit) {
        errors.push(ValidationError::new("events.page_limit", "must be between 1 and 10000"));
    }
    if config.events.max_pages == 0 {
        errors.push(ValidationError::new("events.max_pages", "must be at least 1"));
    }

    if config.monitor.max_attempts == 0 {
        errors.push(ValidationError::new("monitor.max_attempts", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
