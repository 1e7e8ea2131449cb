//! Read-only contract invocation.
//!
//! # Data Flow
//! ```text
//! (contract id, method, args)
//!     → address check (before any budget is spent)
//!     → RetryExecutor attempt:
//!         rate limiter → source sequence (Horizon, falls back to 0)
//!         → unsigned envelope → simulateTransaction → decode return value
//! ```
//!
//! Simulation never submits anything, so the source account is a
//! placeholder and no key material is involved.

use std::sync::Arc;
use stellar_xdr::curr::ScVal;

use crate::blockchain::address::assert_valid_address;
use crate::blockchain::client::{HorizonApi, SorobanApi};
use crate::blockchain::types::{
    FactoryFees, FactoryState, FactoryTokenRecord, StellarError, StellarResult, TokenInfo,
};
use crate::blockchain::value::{
    account_public_key, build_invocation_envelope, contract_address, decode_sc_val, symbol,
    NativeValue,
};
use crate::resilience::RetryExecutor;
use crate::security::rate_limit::RateLimiter;

/// Account with the all-zero ed25519 key. Syntactically valid, owned by nobody.
pub const PLACEHOLDER_SOURCE: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

/// Source account placed on simulation envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSource {
    account_id: String,
    public_key: [u8; 32],
}

impl SimulationSource {
    pub fn new(account_id: &str) -> StellarResult<Self> {
        Ok(Self {
            account_id: account_id.to_string(),
            public_key: account_public_key(account_id)?,
        })
    }

    pub fn placeholder() -> Self {
        Self {
            account_id: PLACEHOLDER_SOURCE.to_string(),
            public_key: [0; 32],
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

/// Issues read-only contract calls through simulation.
pub struct ContractCaller {
    soroban: Arc<dyn SorobanApi>,
    horizon: Arc<dyn HorizonApi>,
    limiter: Arc<RateLimiter>,
    executor: RetryExecutor,
    source: SimulationSource,
}

impl ContractCaller {
    pub fn new(
        soroban: Arc<dyn SorobanApi>,
        horizon: Arc<dyn HorizonApi>,
        limiter: Arc<RateLimiter>,
        executor: RetryExecutor,
        source: SimulationSource,
    ) -> Self {
        Self {
            soroban,
            horizon,
            limiter,
            executor,
            source,
        }
    }

    /// Simulate `method(args)` on `contract_id` and decode its return value.
    pub async fn call_read_only(
        &self,
        contract_id: &str,
        method: &str,
        args: Vec<ScVal>,
    ) -> StellarResult<NativeValue> {
        assert_valid_address(contract_id)?;
        let contract = contract_address(contract_id)?;
        let function = symbol(method)?;

        let (contract, function, args) = (&contract, &function, args.as_slice());
        self.executor
            .run(method, || async move {
                self.limiter.check_limit()?;

                let sequence = self.source_sequence().await;
                let envelope = build_invocation_envelope(
                    self.source.public_key,
                    sequence,
                    contract,
                    function,
                    args,
                )?;

                let response = self.soroban.simulate_transaction(&envelope).await?;
                if let Some(error) = response.error {
                    return Err(StellarError::contract(method, error));
                }
                let result = response
                    .results
                    .first()
                    .ok_or_else(|| StellarError::contract(method, "simulation returned no result"))?;
                decode_sc_val(&result.xdr)
            })
            .await
    }

    /// Current sequence of the simulation source, or 0 if Horizon cannot say.
    async fn source_sequence(&self) -> i64 {
        match self.horizon.account_sequence(&self.source.account_id).await {
            Ok(sequence) => sequence,
            Err(e) => {
                tracing::debug!(
                    account = %self.source.account_id,
                    error = %e,
                    "Source account lookup failed, using sequence 0"
                );
                0
            }
        }
    }

    /// Token metadata from five concurrent calls. Any failure fails the whole.
    pub async fn get_token_info(&self, address: &str) -> StellarResult<TokenInfo> {
        assert_valid_address(address)?;
        self.load_token_info(address)
            .await
            .map_err(|e| e.into_contract_failure("get_token_info"))
    }

    async fn load_token_info(&self, address: &str) -> StellarResult<TokenInfo> {
        let (name, symbol, decimals, total_supply, admin) = tokio::try_join!(
            self.call_read_only(address, "name", Vec::new()),
            self.call_read_only(address, "symbol", Vec::new()),
            self.call_read_only(address, "decimals", Vec::new()),
            self.call_read_only(address, "total_supply", Vec::new()),
            self.call_read_only(address, "admin", Vec::new()),
        )?;

        Ok(TokenInfo {
            address: address.to_string(),
            name: expect_text(name, "name")?,
            symbol: expect_text(symbol, "symbol")?,
            decimals: expect(decimals.as_u32(), "decimals")?,
            total_supply: expect(total_supply.to_decimal_string(), "total_supply")?,
            admin: expect_text(admin, "admin")?,
        })
    }

    /// Registry state of the factory at `factory_id`.
    pub async fn get_factory_state(&self, factory_id: &str) -> StellarResult<FactoryState> {
        self.load_factory_state(factory_id)
            .await
            .map_err(|e| e.into_contract_failure("get_factory_state"))
    }

    async fn load_factory_state(&self, factory_id: &str) -> StellarResult<FactoryState> {
        let (admin, count, tokens, paused) = tokio::try_join!(
            self.call_read_only(factory_id, "get_admin", Vec::new()),
            self.call_read_only(factory_id, "get_token_count", Vec::new()),
            self.call_read_only(factory_id, "get_tokens", Vec::new()),
            self.call_read_only(factory_id, "is_paused", Vec::new()),
        )?;

        let tokens = expect(tokens.as_vec(), "get_tokens")?
            .iter()
            .map(|t| expect(t.as_address().map(str::to_string), "get_tokens"))
            .collect::<StellarResult<Vec<_>>>()?;

        Ok(FactoryState {
            contract_id: factory_id.to_string(),
            admin: expect_text(admin, "get_admin")?,
            total_tokens: expect(count.as_u32(), "get_token_count")?,
            tokens,
            is_paused: expect(paused.as_bool(), "is_paused")?,
        })
    }

    /// Fee schedule from the factory's `get_state` record.
    pub async fn get_factory_fees(&self, factory_id: &str) -> StellarResult<FactoryFees> {
        let state = self
            .call_read_only(factory_id, "get_state", Vec::new())
            .await
            .map_err(|e| e.into_contract_failure("get_factory_fees"))?;

        Ok(FactoryFees {
            contract_id: factory_id.to_string(),
            admin: text_field(&state, "admin", "get_state")?,
            treasury: text_field(&state, "treasury", "get_state")?,
            base_fee: decimal_field(&state, "base_fee", "get_state")?,
            metadata_fee: decimal_field(&state, "metadata_fee", "get_state")?,
        })
    }

    /// Token registered in the factory under `index`.
    pub async fn get_factory_token(
        &self,
        factory_id: &str,
        index: u32,
    ) -> StellarResult<FactoryTokenRecord> {
        let record = self
            .call_read_only(factory_id, "get_token_info", vec![ScVal::U32(index)])
            .await
            .map_err(|e| e.into_contract_failure("get_factory_token"))?;

        let method = "get_token_info";
        let metadata_uri = record
            .field("metadata_uri")
            .cloned()
            .and_then(NativeValue::into_option)
            .map(|value| expect_text(value, method))
            .transpose()?;

        Ok(FactoryTokenRecord {
            address: text_field(&record, "address", method)?,
            creator: text_field(&record, "creator", method)?,
            name: text_field(&record, "name", method)?,
            symbol: text_field(&record, "symbol", method)?,
            decimals: expect(record.field("decimals").and_then(NativeValue::as_u32), method)?,
            total_supply: decimal_field(&record, "total_supply", method)?,
            metadata_uri,
            created_at: expect(record.field("created_at").and_then(NativeValue::as_u64), method)?,
        })
    }
}

fn expect<T>(value: Option<T>, method: &str) -> StellarResult<T> {
    value.ok_or_else(|| StellarError::contract(method, "unexpected return type"))
}

fn expect_text(value: NativeValue, method: &str) -> StellarResult<String> {
    expect(value.as_str().map(str::to_string), method)
}

fn text_field(record: &NativeValue, field: &str, method: &str) -> StellarResult<String> {
    record
        .field(field)
        .and_then(NativeValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| StellarError::contract(method, format!("missing field '{}'", field)))
}

fn decimal_field(record: &NativeValue, field: &str, method: &str) -> StellarResult<String> {
    record
        .field(field)
        .and_then(NativeValue::to_decimal_string)
        .ok_or_else(|| StellarError::contract(method, format!("missing field '{}'", field)))
}
