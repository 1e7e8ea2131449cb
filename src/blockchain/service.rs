//! The integration façade.
//!
//! One `StellarService` per process owns the configuration, the shared rate
//! limiter, and the two RPC surfaces. Every exposed operation lives here.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::blockchain::address::is_valid_address;
use crate::blockchain::client::{HorizonApi, HorizonClient, RawContractEvent, SorobanApi, SorobanRpcClient};
use crate::blockchain::contract::{ContractCaller, SimulationSource};
use crate::blockchain::events::{parse_event, EventReader};
use crate::blockchain::transaction::{MonitorOptions, TransactionFetcher, TransactionMonitor};
use crate::blockchain::types::{
    BurnEvent, FactoryFees, FactoryState, FactoryTokenRecord, MonitorTransactionResult,
    ParsedContractEvent, StellarError, StellarResult, TokenInfo, TransactionDetails,
};
use crate::config::StellarConfig;
use crate::resilience::RetryExecutor;
use crate::security::rate_limit::RateLimiter;

/// Stellar/Soroban client with retries, rate limiting and monitoring.
pub struct StellarService {
    config: Arc<StellarConfig>,
    limiter: Arc<RateLimiter>,
    contracts: ContractCaller,
    events: EventReader,
    fetcher: TransactionFetcher,
    monitor: TransactionMonitor,
}

impl StellarService {
    /// Build a service talking to the configured Horizon and Soroban endpoints.
    pub fn new(config: StellarConfig) -> StellarResult<Self> {
        let timeout = config.request_timeout();
        let horizon = HorizonClient::new(config.horizon_url(), timeout)?;
        let soroban = SorobanRpcClient::new(config.soroban_rpc_url(), timeout)?;
        Self::with_clients(config, Arc::new(horizon), Arc::new(soroban))
    }

    /// Build a service over caller-supplied RPC surfaces.
    pub fn with_clients(
        config: StellarConfig,
        horizon: Arc<dyn HorizonApi>,
        soroban: Arc<dyn SorobanApi>,
    ) -> StellarResult<Self> {
        let source = match config.simulation_source.as_deref() {
            Some(account) => SimulationSource::new(account)?,
            None => SimulationSource::placeholder(),
        };

        let limiter = Arc::new(RateLimiter::from_policy(&config.rate_limit));
        let executor = RetryExecutor::new(config.retry.clone(), config.request_timeout());

        let contracts = ContractCaller::new(
            soroban.clone(),
            horizon.clone(),
            limiter.clone(),
            executor.clone(),
            source,
        );
        let events = EventReader::new(soroban, limiter.clone(), executor.clone(), config.events.clone());
        let fetcher = TransactionFetcher::new(horizon, limiter.clone(), executor);
        let monitor = TransactionMonitor::new(fetcher.clone());

        tracing::info!(
            network = %config.network,
            passphrase = config.network.passphrase(),
            horizon = config.horizon_url(),
            soroban = config.soroban_rpc_url(),
            factory = config.factory_contract_id.as_deref().unwrap_or("-"),
            "Stellar service ready"
        );

        Ok(Self {
            config: Arc::new(config),
            limiter,
            contracts,
            events,
            fetcher,
            monitor,
        })
    }

    pub fn config(&self) -> &StellarConfig {
        &self.config
    }

    /// Whether `address` is a well-formed account or contract address.
    pub fn validate_address(&self, address: &str) -> bool {
        is_valid_address(address)
    }

    pub async fn get_token_info(&self, address: &str) -> StellarResult<TokenInfo> {
        self.contracts.get_token_info(address).await
    }

    pub async fn get_burn_history(&self, token_address: &str) -> StellarResult<Vec<BurnEvent>> {
        self.events.get_burn_history(token_address).await
    }

    pub async fn get_factory_state(&self) -> StellarResult<FactoryState> {
        let factory = self.factory_id("get_factory_state")?;
        self.contracts.get_factory_state(factory).await
    }

    pub async fn get_factory_fees(&self) -> StellarResult<FactoryFees> {
        let factory = self.factory_id("get_factory_fees")?;
        self.contracts.get_factory_fees(factory).await
    }

    pub async fn get_factory_token(&self, index: u32) -> StellarResult<FactoryTokenRecord> {
        let factory = self.factory_id("get_factory_token")?;
        self.contracts.get_factory_token(factory, index).await
    }

    pub async fn get_transaction(&self, hash: &str) -> StellarResult<TransactionDetails> {
        self.fetcher.get_transaction(hash).await
    }

    /// Poll `hash` with the configured monitor defaults.
    pub async fn monitor_transaction(&self, hash: &str) -> MonitorTransactionResult {
        self.monitor_transaction_with(hash, MonitorOptions::from(&self.config.monitor))
            .await
    }

    pub async fn monitor_transaction_with(
        &self,
        hash: &str,
        options: MonitorOptions,
    ) -> MonitorTransactionResult {
        self.monitor.monitor_transaction(hash, options).await
    }

    /// Poll `hash` until terminal, out of attempts, or `shutdown` fires.
    pub async fn monitor_transaction_until(
        &self,
        hash: &str,
        options: MonitorOptions,
        shutdown: broadcast::Receiver<()>,
    ) -> MonitorTransactionResult {
        self.monitor
            .monitor_transaction_until(hash, options, shutdown)
            .await
    }

    pub fn parse_event(&self, raw: &RawContractEvent) -> StellarResult<ParsedContractEvent> {
        parse_event(raw)
    }

    /// Requests the limiter would still admit in the current window.
    pub fn rate_limit_remaining(&self) -> usize {
        self.limiter.remaining()
    }

    fn factory_id(&self, operation: &str) -> StellarResult<&str> {
        self.config
            .factory_contract_id
            .as_deref()
            .ok_or_else(|| StellarError::contract(operation, "factory contract is not configured"))
    }
}
