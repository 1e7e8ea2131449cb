//! Stellar RPC clients.
//!
//! # Responsibilities
//! - Horizon (classic ledger API): account sequence, transaction by hash
//! - Soroban RPC (JSON-RPC 2.0): `simulateTransaction`, `getEvents`
//! - Map provider failures onto the error taxonomy (404 → `NotFound`,
//!   everything else → `Network`)
//!
//! Both surfaces sit behind traits so the service can be driven by mocks.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

use crate::blockchain::types::{
    StellarError, StellarResult, TransactionDetails, TransactionStatus,
};
use crate::observability::metrics;

/// The classic ledger surface.
#[async_trait]
pub trait HorizonApi: Send + Sync {
    /// Current sequence number of `account_id`.
    async fn account_sequence(&self, account_id: &str) -> StellarResult<i64>;

    /// One transaction by hash. Unknown hashes fail with `NotFound`.
    async fn transaction(&self, hash: &str) -> StellarResult<HorizonTransaction>;
}

/// The contract simulation/query surface.
#[async_trait]
pub trait SorobanApi: Send + Sync {
    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> StellarResult<SimulateTransactionResponse>;

    async fn get_events(&self, request: &GetEventsRequest) -> StellarResult<GetEventsResponse>;
}

/// Horizon `/transactions/{hash}` record (fields used here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonTransaction {
    pub hash: String,
    pub ledger: u32,
    pub created_at: String,
    pub source_account: String,
    pub fee_charged: String,
    pub successful: bool,
    #[serde(default)]
    pub memo: Option<String>,
    pub operation_count: u32,
    #[serde(default)]
    pub envelope_xdr: String,
    #[serde(default)]
    pub result_xdr: String,
    #[serde(default)]
    pub result_meta_xdr: String,
}

impl From<HorizonTransaction> for TransactionDetails {
    fn from(tx: HorizonTransaction) -> Self {
        Self {
            hash: tx.hash,
            ledger: tx.ledger,
            created_at: tx.created_at,
            source_account: tx.source_account,
            fee: tx.fee_charged,
            status: if tx.successful {
                TransactionStatus::Success
            } else {
                TransactionStatus::Failed
            },
            memo: tx.memo,
            operation_count: tx.operation_count,
            envelope_xdr: tx.envelope_xdr,
            result_xdr: tx.result_xdr,
            result_meta_xdr: tx.result_meta_xdr,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HorizonAccount {
    sequence: String,
}

/// `simulateTransaction` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    /// Present when the host rejected the invocation.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub results: Vec<SimulateHostFunctionResult>,
    #[serde(default)]
    pub latest_ledger: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateHostFunctionResult {
    /// Base64 `ScVal` return value.
    pub xdr: String,
    #[serde(default)]
    pub auth: Vec<String>,
}

/// `getEvents` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEventsRequest {
    /// Omitted when paging with a cursor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ledger: Option<u32>,
    pub filters: Vec<EventFilter>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(rename = "type")]
    pub event_type: String,
    pub contract_ids: Vec<String>,
    /// Each inner list is one topic pattern: base64 `ScVal`s or `"*"`.
    pub topics: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub limit: u32,
}

/// `getEvents` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEventsResponse {
    #[serde(default)]
    pub events: Vec<RawContractEvent>,
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Event envelope as returned by `getEvents`; topics and value are base64 XDR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContractEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub ledger: u32,
    pub ledger_closed_at: String,
    pub contract_id: String,
    #[serde(default)]
    pub id: String,
    pub topic: Vec<String>,
    pub value: String,
    #[serde(default)]
    pub in_successful_contract_call: bool,
    pub tx_hash: String,
}

fn http_client(timeout: Duration) -> StellarResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("stellar-integration/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StellarError::Network(format!("cannot build HTTP client: {}", e)))
}

fn parse_base_url(raw: &str) -> StellarResult<Url> {
    Url::parse(raw).map_err(|e| StellarError::Network(format!("Invalid RPC URL '{}': {}", raw, e)))
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> StellarError {
    if e.is_timeout() {
        StellarError::Timeout(timeout.as_millis() as u64)
    } else {
        StellarError::Network(e.to_string())
    }
}

/// Horizon REST client.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HorizonClient {
    pub fn new(base_url: &str, timeout: Duration) -> StellarResult<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: parse_base_url(base_url)?,
            timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> StellarResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StellarError::Network(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, method: &str, url: Url) -> StellarResult<T> {
        let start = Instant::now();
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_rpc_request("horizon", method, "error", start);
                return Err(transport_error(e, self.timeout));
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            metrics::record_rpc_request("horizon", method, "not_found", start);
            return Err(StellarError::NotFound(format!("{} returned 404", method)));
        }
        if !status.is_success() {
            metrics::record_rpc_request("horizon", method, "error", start);
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(method = method, status = %status, body = %body, "Horizon error response");
            return Err(StellarError::Network(format!("Horizon {} returned {}", method, status)));
        }

        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| StellarError::Network(format!("invalid Horizon response: {}", e)));
        metrics::record_rpc_request(
            "horizon",
            method,
            if parsed.is_ok() { "ok" } else { "error" },
            start,
        );
        parsed
    }
}

#[async_trait]
impl HorizonApi for HorizonClient {
    async fn account_sequence(&self, account_id: &str) -> StellarResult<i64> {
        let url = self.endpoint(&["accounts", account_id])?;
        let account: HorizonAccount = self.get_json("get_account", url).await?;
        account
            .sequence
            .parse()
            .map_err(|_| StellarError::Network(format!("invalid sequence '{}'", account.sequence)))
    }

    async fn transaction(&self, hash: &str) -> StellarResult<HorizonTransaction> {
        let url = self.endpoint(&["transactions", hash])?;
        self.get_json("get_transaction", url).await.map_err(|e| match e {
            StellarError::NotFound(_) => StellarError::NotFound(format!("transaction {}", hash)),
            other => other,
        })
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: String,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct JsonRpcResponse<R> {
    result: Option<R>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct SimulateParams<'a> {
    transaction: &'a str,
}

/// Soroban JSON-RPC client.
#[derive(Debug, Clone)]
pub struct SorobanRpcClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl SorobanRpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> StellarResult<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint: parse_base_url(endpoint)?,
            timeout,
        })
    }

    async fn call<P, R>(&self, method: &str, params: P) -> StellarResult<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let start = Instant::now();
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: uuid::Uuid::new_v4().to_string(),
            method,
            params,
        };

        let response = match self.http.post(self.endpoint.clone()).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_rpc_request("soroban", method, "error", start);
                return Err(transport_error(e, self.timeout));
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_rpc_request("soroban", method, "error", start);
            return Err(StellarError::Network(format!("Soroban RPC {} returned {}", method, status)));
        }

        let envelope: JsonRpcResponse<R> = response.json().await.map_err(|e| {
            metrics::record_rpc_request("soroban", method, "error", start);
            StellarError::Network(format!("invalid Soroban RPC response: {}", e))
        })?;

        if let Some(err) = envelope.error {
            metrics::record_rpc_request("soroban", method, "error", start);
            tracing::debug!(method = method, code = err.code, message = %err.message, "JSON-RPC error");
            return Err(StellarError::Network(format!(
                "Soroban RPC {} error {}: {}",
                method, err.code, err.message
            )));
        }

        let result = envelope.result.ok_or_else(|| {
            StellarError::Network(format!("Soroban RPC {} returned no result", method))
        });
        metrics::record_rpc_request(
            "soroban",
            method,
            if result.is_ok() { "ok" } else { "error" },
            start,
        );
        result
    }
}

#[async_trait]
impl SorobanApi for SorobanRpcClient {
    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> StellarResult<SimulateTransactionResponse> {
        self.call(
            "simulateTransaction",
            SimulateParams {
                transaction: envelope_xdr,
            },
        )
        .await
    }

    async fn get_events(&self, request: &GetEventsRequest) -> StellarResult<GetEventsResponse> {
        self.call("getEvents", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_endpoint_joins_segments() {
        let client =
            HorizonClient::new("https://horizon-testnet.stellar.org/", Duration::from_secs(5)).unwrap();
        let url = client.endpoint(&["transactions", "abc123"]).unwrap();
        assert_eq!(url.as_str(), "https://horizon-testnet.stellar.org/transactions/abc123");

        // path segments are escaped, not interpreted
        let url = client.endpoint(&["transactions", "../accounts"]).unwrap();
        assert!(url.path().ends_with("/transactions/..%2Faccounts"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HorizonClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, StellarError::Network(_)));
    }

    #[test]
    fn test_horizon_transaction_maps_to_details() {
        let json = serde_json::json!({
            "hash": "ab12",
            "ledger": 512,
            "created_at": "2024-03-01T12:00:00Z",
            "source_account": "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF",
            "fee_charged": "100",
            "successful": false,
            "operation_count": 1,
            "envelope_xdr": "AAAA",
            "result_xdr": "BBBB",
            "result_meta_xdr": "CCCC",
            "memo_type": "none"
        });
        let tx: HorizonTransaction = serde_json::from_value(json).unwrap();
        let details = TransactionDetails::from(tx);
        assert_eq!(details.status, TransactionStatus::Failed);
        assert_eq!(details.fee, "100");
        assert_eq!(details.memo, None);
        assert_eq!(details.result_xdr, "BBBB");
    }

    #[test]
    fn test_get_events_request_shape() {
        let request = GetEventsRequest {
            start_ledger: Some(1),
            filters: vec![EventFilter {
                event_type: "contract".to_string(),
                contract_ids: vec!["CID".to_string()],
                topics: vec![vec!["AAAADwAAAARidXJu".to_string(), "*".to_string()]],
            }],
            pagination: Pagination { cursor: None, limit: 100 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["startLedger"], 1);
        assert_eq!(json["filters"][0]["type"], "contract");
        assert_eq!(json["filters"][0]["contractIds"][0], "CID");
        assert!(json["pagination"].get("cursor").is_none());
    }

    #[test]
    fn test_simulate_response_with_error() {
        let response: SimulateTransactionResponse = serde_json::from_value(serde_json::json!({
            "error": "HostError: Error(WasmVm, MissingValue)",
            "latestLedger": 1000
        }))
        .unwrap();
        assert!(response.error.is_some());
        assert!(response.results.is_empty());
    }
}
