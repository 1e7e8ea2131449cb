//! Transaction lookup and confirmation monitoring.
//!
//! # Responsibilities
//! - Fetch one transaction by hash through the retry wrapper
//! - Poll for a terminal outcome at a coarser grain, without the retry wrapper
//! - Allow monitoring to be abandoned through the shutdown broadcast
//!
//! # Monitor states
//! ```text
//! polling ──found, successful──────────→ success
//!    │    ──found, not successful──────→ failed
//!    │    ──not found, attempts spent──→ not_found
//!    │    ──other error, attempts spent→ pending
//!    └──── shutdown during a sleep ────→ pending
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::blockchain::client::HorizonApi;
use crate::blockchain::types::{
    MonitorStatus, MonitorTransactionResult, StellarError, StellarResult, TransactionDetails,
};
use crate::config::MonitorConfig;
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::resilience::RetryExecutor;
use crate::security::rate_limit::RateLimiter;

/// Polling parameters for `TransactionMonitor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl MonitorOptions {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }
}

impl From<&MonitorConfig> for MonitorOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.poll_interval_ms),
        )
    }
}

/// Fetches transactions from Horizon.
#[derive(Clone)]
pub struct TransactionFetcher {
    horizon: Arc<dyn HorizonApi>,
    limiter: Arc<RateLimiter>,
    executor: RetryExecutor,
}

impl TransactionFetcher {
    pub fn new(horizon: Arc<dyn HorizonApi>, limiter: Arc<RateLimiter>, executor: RetryExecutor) -> Self {
        Self {
            horizon,
            limiter,
            executor,
        }
    }

    /// Full details of `hash`, with retries.
    pub async fn get_transaction(&self, hash: &str) -> StellarResult<TransactionDetails> {
        if hash.is_empty() {
            return Err(StellarError::NotFound("empty transaction hash".to_string()));
        }

        self.executor
            .run("get_transaction", || async move {
                self.limiter.check_limit()?;
                self.fetch_once(hash).await
            })
            .await
    }

    /// A single lookup: no limiter check, no retry, no deadline.
    pub async fn fetch_once(&self, hash: &str) -> StellarResult<TransactionDetails> {
        self.horizon.transaction(hash).await.map(TransactionDetails::from)
    }

    fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn request_timeout(&self) -> Duration {
        self.executor.request_timeout()
    }
}

/// Polls a transaction until it reaches a terminal state.
pub struct TransactionMonitor {
    fetcher: TransactionFetcher,
}

impl TransactionMonitor {
    pub fn new(fetcher: TransactionFetcher) -> Self {
        Self { fetcher }
    }

    /// Poll `hash` until terminal or out of attempts.
    pub async fn monitor_transaction(
        &self,
        hash: &str,
        options: MonitorOptions,
    ) -> MonitorTransactionResult {
        self.poll(hash, options, None).await
    }

    /// Like `monitor_transaction`, but a shutdown signal during a poll sleep
    /// ends monitoring with `pending`.
    pub async fn monitor_transaction_until(
        &self,
        hash: &str,
        options: MonitorOptions,
        mut shutdown: broadcast::Receiver<()>,
    ) -> MonitorTransactionResult {
        self.poll(hash, options, Some(&mut shutdown)).await
    }

    async fn poll(
        &self,
        hash: &str,
        options: MonitorOptions,
        mut shutdown: Option<&mut broadcast::Receiver<()>>,
    ) -> MonitorTransactionResult {
        if hash.is_empty() {
            return finish(MonitorTransactionResult::bare(hash, MonitorStatus::NotFound, 1));
        }

        let max_attempts = options.max_attempts.max(1);
        let mut attempts = 0;

        while attempts < max_attempts {
            attempts += 1;

            let lookup = match self.fetcher.limiter().check_limit() {
                Ok(()) => {
                    with_deadline(self.fetcher.request_timeout(), self.fetcher.fetch_once(hash))
                        .await
                }
                Err(e) => Err(e),
            };

            match lookup {
                Ok(tx) => return finish(terminal(tx, attempts)),
                Err(StellarError::NotFound(_)) if attempts >= max_attempts => {
                    return finish(MonitorTransactionResult::bare(
                        hash,
                        MonitorStatus::NotFound,
                        attempts,
                    ));
                }
                Err(StellarError::NotFound(_)) => {
                    tracing::debug!(hash = hash, attempt = attempts, "Transaction not yet visible");
                }
                Err(e) => {
                    tracing::debug!(
                        hash = hash,
                        attempt = attempts,
                        kind = e.kind(),
                        error = %e,
                        "Transient monitoring failure"
                    );
                }
            }

            if attempts < max_attempts && !sleep_or_cancel(options.poll_interval, &mut shutdown).await {
                tracing::info!(hash = hash, attempts = attempts, "Monitoring cancelled");
                return finish(MonitorTransactionResult::bare(hash, MonitorStatus::Pending, attempts));
            }
        }

        finish(MonitorTransactionResult::bare(hash, MonitorStatus::Pending, attempts))
    }
}

fn terminal(tx: TransactionDetails, attempts: u32) -> MonitorTransactionResult {
    let successful = tx.is_successful();
    MonitorTransactionResult {
        status: if successful {
            MonitorStatus::Success
        } else {
            MonitorStatus::Failed
        },
        ledger: Some(tx.ledger),
        created_at: Some(tx.created_at),
        error_message: if successful { None } else { Some(tx.result_xdr) },
        hash: tx.hash,
        attempts,
    }
}

fn finish(result: MonitorTransactionResult) -> MonitorTransactionResult {
    tracing::info!(
        hash = %result.hash,
        status = result.status.as_str(),
        attempts = result.attempts,
        "Monitoring finished"
    );
    metrics::record_monitor_outcome(result.status.as_str());
    result
}

/// Sleep for `interval`. Returns false if shutdown fired first.
async fn sleep_or_cancel(
    interval: Duration,
    shutdown: &mut Option<&mut broadcast::Receiver<()>>,
) -> bool {
    let Some(rx) = shutdown.as_deref_mut() else {
        tokio::time::sleep(interval).await;
        return true;
    };

    tokio::select! {
        _ = tokio::time::sleep(interval) => true,
        signal = rx.recv() => match signal {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => false,
            // sender gone: nobody can cancel any more
            Err(broadcast::error::RecvError::Closed) => {
                tokio::time::sleep(interval).await;
                true
            }
        },
    }
}
