//! Stellar-specific records and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::value::NativeValue;

// Re-export StellarConfig from config module to avoid duplication
pub use crate::config::schema::StellarConfig;

/// Errors that can occur during Stellar operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StellarError {
    /// Address string is not a well-formed account or contract identity.
    #[error("Invalid Stellar address: {0}")]
    InvalidAddress(String),

    /// Local sliding-window budget is exhausted.
    #[error("Rate limit exceeded: {max_requests} requests per {window_ms}ms")]
    RateLimited { max_requests: usize, window_ms: u64 },

    /// Simulation reported an error, or a dependent sub-call failed.
    #[error("Contract call '{method}' failed: {cause}")]
    ContractCallFailed { method: String, cause: String },

    /// The ledger does not know the resource (yet).
    #[error("Not found: {0}")]
    NotFound(String),

    /// On-chain payload could not be decoded.
    #[error("Failed to parse event payload: {0}")]
    ParseFailed(String),

    /// A single attempt exceeded its deadline.
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Any other transport failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl StellarError {
    /// Whether `RetryExecutor` may re-invoke the operation after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ContractCallFailed { .. })
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::RateLimited { .. } => "rate_limited",
            Self::ContractCallFailed { .. } => "contract_call_failed",
            Self::NotFound(_) => "not_found",
            Self::ParseFailed(_) => "parse_failed",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
        }
    }

    /// Shorthand for a `ContractCallFailed`.
    pub fn contract(method: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::ContractCallFailed {
            method: method.into(),
            cause: cause.into(),
        }
    }

    /// Fold any failure of a composite's sub-call into `ContractCallFailed`.
    ///
    /// Errors that already are `ContractCallFailed` keep the failing method.
    pub fn into_contract_failure(self, operation: &str) -> Self {
        match self {
            Self::ContractCallFailed { .. } => self,
            other => Self::contract(operation, other.to_string()),
        }
    }
}

/// Result type for Stellar operations.
pub type StellarResult<T> = Result<T, StellarError>;

/// Token metadata read from a token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    /// Decimal string; supplies are 128-bit on chain.
    pub total_supply: String,
    pub admin: String,
}

/// One `burn` event emitted by a token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnEvent {
    pub tx_hash: String,
    pub ledger: u32,
    pub timestamp: String,
    pub from: String,
    pub amount: String,
    pub token_address: String,
}

/// Registry view of the token factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryState {
    pub contract_id: String,
    pub admin: String,
    pub total_tokens: u32,
    pub tokens: Vec<String>,
    pub is_paused: bool,
}

/// Fee schedule held by the token factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryFees {
    pub contract_id: String,
    pub admin: String,
    pub treasury: String,
    pub base_fee: String,
    pub metadata_fee: String,
}

/// A token as registered in the factory under an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryTokenRecord {
    pub address: String,
    pub creator: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub total_supply: String,
    pub metadata_uri: Option<String>,
    pub created_at: u64,
}

/// A decoded contract event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedContractEvent {
    /// First topic, as text.
    #[serde(rename = "type")]
    pub event_type: String,
    pub contract_id: String,
    /// Remaining topics after the type tag.
    pub topics: Vec<NativeValue>,
    pub data: NativeValue,
    pub ledger: u32,
    pub tx_hash: String,
    /// ISO-8601, UTC, millisecond precision.
    pub timestamp: String,
}

/// Final status of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Full details of one transaction from the ledger surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub hash: String,
    pub ledger: u32,
    pub created_at: String,
    pub source_account: String,
    pub fee: String,
    pub status: TransactionStatus,
    pub memo: Option<String>,
    pub operation_count: u32,
    pub envelope_xdr: String,
    pub result_xdr: String,
    pub result_meta_xdr: String,
}

impl TransactionDetails {
    pub fn is_successful(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

/// Terminal outcome of transaction monitoring.
///
/// `Pending` means "ask again later", not failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    Success,
    Failed,
    NotFound,
    Pending,
}

impl MonitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
            Self::Pending => "pending",
        }
    }
}

/// Result of `monitor_transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorTransactionResult {
    pub hash: String,
    pub status: MonitorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub attempts: u32,
}

impl MonitorTransactionResult {
    /// Result carrying only a status, for the inconclusive outcomes.
    pub fn bare(hash: &str, status: MonitorStatus, attempts: u32) -> Self {
        Self {
            hash: hash.to_string(),
            status,
            ledger: None,
            created_at: None,
            error_message: None,
            attempts,
        }
    }
}
