//! Retry logic.
//!
//! # Responsibilities
//! - Bound each attempt with the request deadline
//! - Classify failures (`StellarError::is_retryable`)
//! - Re-invoke retryable failures with exponential backoff
//!
//! # Design Decisions
//! - Attempts are strictly sequential
//! - Non-retryable errors propagate on first sight
//! - Exhaustion returns the last observed error

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::StellarResult;
use crate::config::RetryPolicy;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::timeouts::with_deadline;

/// Wraps single RPC operations with deadline, classification and backoff.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    request_timeout: Duration,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, request_timeout: Duration) -> Self {
        Self {
            policy,
            request_timeout,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Run `op` until it succeeds, fails non-retryably, or attempts run out.
    ///
    /// `operation` labels logs and metrics.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> StellarResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StellarResult<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match with_deadline(self.request_timeout, op()).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_retryable() {
                tracing::debug!(
                    operation = operation,
                    attempt = attempt,
                    kind = err.kind(),
                    error = %err,
                    "Non-retryable failure"
                );
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                tracing::warn!(
                    operation = operation,
                    attempts = max_attempts,
                    error = %err,
                    "Retries exhausted"
                );
                return Err(err);
            }

            let delay = calculate_backoff(
                attempt,
                self.policy.initial_delay_ms,
                self.policy.max_delay_ms,
                self.policy.backoff_factor,
            );
            tracing::warn!(
                operation = operation,
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying operation"
            );
            metrics::record_retry(operation);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::StellarError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn executor(max_attempts: u32) -> RetryExecutor {
        RetryExecutor::new(
            RetryPolicy {
                max_attempts,
                initial_delay_ms: 1000,
                max_delay_ms: 10_000,
                backoff_factor: 2.0,
            },
            Duration::from_secs(30),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_retryable_failures() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let result = executor(3)
            .run("flaky", || async move {
                let n = calls_ref.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(StellarError::Network("connection reset".into()))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_invoked_once() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let result: StellarResult<()> = executor(5)
            .run("lookup", || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Err(StellarError::NotFound("tx".into()))
            })
            .await;

        assert_eq!(result, Err(StellarError::NotFound("tx".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let result: StellarResult<()> = executor(3)
            .run("always-down", || async move {
                let n = calls_ref.fetch_add(1, Ordering::SeqCst);
                Err(StellarError::Network(format!("failure {}", n)))
            })
            .await;

        assert_eq!(result, Err(StellarError::Network("failure 2".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleeps_between_attempts() {
        let start = tokio::time::Instant::now();
        let _: StellarResult<()> = executor(3)
            .run("slow", || async { Err(StellarError::Network("down".into())) })
            .await;

        // 1000ms after the first failure, 2000ms after the second
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_final() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let executor = RetryExecutor::new(executor(3).policy().clone(), Duration::from_millis(100));

        let result: StellarResult<()> = executor
            .run("hanging", || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert_eq!(result, Err(StellarError::Timeout(100)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_is_not_retried() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let result: StellarResult<()> = executor(3)
            .run("limited", || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Err(StellarError::RateLimited { max_requests: 1, window_ms: 1000 })
            })
            .await;

        assert!(matches!(result, Err(StellarError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
