//! Exponential backoff.
//!
//! Deterministic: `min(initial * factor^attempt, max)`, no jitter.

use std::time::Duration;

/// Calculate the delay before retry number `attempt` (zero-based).
pub fn calculate_backoff(attempt: u32, initial_ms: u64, max_ms: u64, factor: f64) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let delay_ms = initial_ms as f64 * factor.powi(exponent);

    // inf/NaN from huge exponents collapse to the cap
    let capped = if delay_ms.is_finite() {
        delay_ms.min(max_ms as f64)
    } else {
        max_ms as f64
    };

    Duration::from_millis(capped.max(0.0).round() as u64)
}
