//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound every network attempt by a deadline
//! - Report expiry as `StellarError::Timeout`, distinct from transport errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Expiry drops the inner future, which aborts the in-flight HTTP request

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::{StellarError, StellarResult};

/// Run `fut` with a deadline of `limit`.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> StellarResult<T>
where
    F: Future<Output = StellarResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StellarError::Timeout(limit.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry() {
        let result: StellarResult<()> = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(StellarError::Timeout(50)));
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let ok = with_deadline(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: StellarResult<u32> = with_deadline(Duration::from_secs(1), async {
            Err(StellarError::Network("refused".into()))
        })
        .await;
        assert_eq!(err, Err(StellarError::Network("refused".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_operation_is_dropped() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let _ = with_deadline(Duration::from_millis(10), async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
