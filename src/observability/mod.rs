//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RetryExecutor, RateLimiter, RPC clients, TransactionMonitor:
//!     → logging.rs (tracing events on stderr, pretty or JSON)
//!     → metrics.rs (request counts, latency, retries, budget, monitor outcomes)
//!
//! Consumers:
//!     → Operator terminal / log shipper
//!     → Prometheus scrape (only when the CLI enables the exporter)
//! ```

pub mod logging;
pub mod metrics;
