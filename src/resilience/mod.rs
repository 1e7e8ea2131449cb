//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! RPC operation:
//!     → retries.rs (attempt loop, error classification)
//!     → timeouts.rs (per-attempt deadline)
//!     → On retryable failure: backoff.rs (delay before next attempt)
//! ```
//!
//! # Design Decisions
//! - Every network-touching operation passes through `RetryExecutor`
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Retries only for transport and contract failures; bad input is final

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::RetryExecutor;
