//! Sliding-window rate limiting for outbound RPC requests.
//!
//! One limiter per service instance. The window is a queue of admission
//! instants in insertion order, so expiry only ever pops from the front.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::blockchain::types::{StellarError, StellarResult};
use crate::config::RateLimitPolicy;
use crate::observability::metrics;

/// At most `max_requests` admissions per `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Every entry satisfies `now - entry < window` after pruning.
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn from_policy(policy: &RateLimitPolicy) -> Self {
        Self::new(policy.max_requests, Duration::from_millis(policy.window_ms))
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        // The queue is valid after any partial update, so poisoning is harmless.
        self.timestamps.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admit one request or fail with `RateLimited`.
    ///
    /// Prune and admit happen under one lock, so concurrent callers cannot
    /// overshoot the budget.
    pub fn check_limit(&self) -> StellarResult<()> {
        let now = Instant::now();
        let mut timestamps = self.lock();

        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            tracing::warn!(
                max_requests = self.max_requests,
                window_ms = self.window.as_millis() as u64,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();
            return Err(StellarError::RateLimited {
                max_requests: self.max_requests,
                window_ms: self.window.as_millis() as u64,
            });
        }

        timestamps.push_back(now);
        metrics::record_rate_limit_remaining(self.max_requests - timestamps.len());
        Ok(())
    }

    /// Requests still admissible in the current window. Does not prune.
    pub fn remaining(&self) -> usize {
        let now = Instant::now();
        let active = self
            .lock()
            .iter()
            .filter(|&&t| now.duration_since(t) < self.window)
            .count();
        self.max_requests.saturating_sub(active)
    }

    /// Forget every admission.
    pub fn reset(&self) {
        self.lock().clear();
    }
}
