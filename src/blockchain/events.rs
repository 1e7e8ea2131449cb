//! Contract event decoding and burn history.
//!
//! # Data Flow
//! ```text
//! getEvents (contract id + topic filter, paged)
//!     → RawContractEvent (base64 XDR topics/value)
//!     → parse_event (ParsedContractEvent)
//!     → BurnEvent projection
//! ```
//!
//! Decode failures abort the whole batch; no partial histories.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;

use crate::blockchain::address::assert_valid_address;
use crate::blockchain::client::{
    EventFilter, GetEventsRequest, Pagination, RawContractEvent, SorobanApi,
};
use crate::blockchain::types::{BurnEvent, ParsedContractEvent, StellarError, StellarResult};
use crate::blockchain::value::{decode_sc_val, encode_sc_val, symbol, NativeValue};
use crate::config::EventQueryConfig;
use crate::resilience::RetryExecutor;
use crate::security::rate_limit::RateLimiter;

/// Topic tag of token burn events.
pub const BURN_TOPIC: &str = "burn";

/// Matches exactly one topic segment in an event filter.
const ANY_TOPIC: &str = "*";

/// Decode one raw event.
pub fn parse_event(raw: &RawContractEvent) -> StellarResult<ParsedContractEvent> {
    let mut topics = raw
        .topic
        .iter()
        .map(|t| decode_sc_val(t))
        .collect::<StellarResult<Vec<_>>>()?
        .into_iter();

    let event_type = match topics.next() {
        Some(NativeValue::Symbol(s)) | Some(NativeValue::String(s)) => s,
        Some(other) => other.to_string(),
        None => {
            return Err(StellarError::ParseFailed(format!(
                "event {} has no topics",
                raw.id
            )))
        }
    };

    Ok(ParsedContractEvent {
        event_type,
        contract_id: raw.contract_id.clone(),
        topics: topics.collect(),
        data: decode_sc_val(&raw.value)?,
        ledger: raw.ledger,
        tx_hash: raw.tx_hash.clone(),
        timestamp: to_iso8601(&raw.ledger_closed_at)?,
    })
}

/// Normalize a ledger close time to `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn to_iso8601(closed_at: &str) -> StellarResult<String> {
    DateTime::parse_from_rfc3339(closed_at)
        .map(|t| t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
        .map_err(|e| StellarError::ParseFailed(format!("invalid close time '{}': {}", closed_at, e)))
}

impl BurnEvent {
    /// Project a parsed `burn` event: first remaining topic is the burner,
    /// the payload is the amount.
    pub fn from_parsed(event: ParsedContractEvent, token_address: &str) -> StellarResult<Self> {
        let from = event
            .topics
            .first()
            .map(|t| t.to_string())
            .ok_or_else(|| {
                StellarError::ParseFailed(format!("burn event in {} has no sender", event.tx_hash))
            })?;

        Ok(Self {
            tx_hash: event.tx_hash,
            ledger: event.ledger,
            timestamp: event.timestamp,
            from,
            amount: event.data.to_string(),
            token_address: token_address.to_string(),
        })
    }
}

/// Reads contract events from the Soroban RPC.
pub struct EventReader {
    soroban: Arc<dyn SorobanApi>,
    limiter: Arc<RateLimiter>,
    executor: RetryExecutor,
    query: EventQueryConfig,
}

impl EventReader {
    pub fn new(
        soroban: Arc<dyn SorobanApi>,
        limiter: Arc<RateLimiter>,
        executor: RetryExecutor,
        query: EventQueryConfig,
    ) -> Self {
        Self {
            soroban,
            limiter,
            executor,
            query,
        }
    }

    /// Every `burn` event emitted by `token_address`.
    pub async fn get_burn_history(&self, token_address: &str) -> StellarResult<Vec<BurnEvent>> {
        assert_valid_address(token_address)?;

        let burn_topic = encode_sc_val(&stellar_xdr::curr::ScVal::Symbol(symbol(BURN_TOPIC)?))?;
        let filter = EventFilter {
            event_type: "contract".to_string(),
            contract_ids: vec![token_address.to_string()],
            topics: vec![vec![burn_topic, ANY_TOPIC.to_string()]],
        };

        let raw_events = self.fetch_all(filter).await?;

        let burns = raw_events
            .iter()
            .map(|raw| parse_event(raw).and_then(|e| BurnEvent::from_parsed(e, token_address)))
            .collect::<StellarResult<Vec<_>>>()?;

        tracing::debug!(
            token = token_address,
            count = burns.len(),
            "Loaded burn history"
        );
        Ok(burns)
    }

    /// Follow pagination cursors until a short page or the page cap.
    async fn fetch_all(&self, filter: EventFilter) -> StellarResult<Vec<RawContractEvent>> {
        let mut events = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..self.query.max_pages {
            let request = GetEventsRequest {
                start_ledger: if cursor.is_none() {
                    Some(self.query.start_ledger)
                } else {
                    None
                },
                filters: vec![filter.clone()],
                pagination: Pagination {
                    cursor: cursor.clone(),
                    limit: self.query.page_limit,
                },
            };
            let request = &request;

            let response = self
                .executor
                .run("get_events", || async move {
                    self.limiter.check_limit()?;
                    self.soroban.get_events(request).await.map_err(|e| match e {
                        StellarError::Network(cause) => StellarError::contract("getEvents", cause),
                        other => other,
                    })
                })
                .await?;

            let fetched = response.events.len();
            events.extend(response.events);

            if fetched < self.query.page_limit as usize || response.cursor.is_none() {
                break;
            }
            if page + 1 == self.query.max_pages {
                tracing::warn!(
                    pages = self.query.max_pages,
                    events = events.len(),
                    "Event page cap reached; history truncated"
                );
            }
            cursor = response.cursor;
        }

        Ok(events)
    }
}
