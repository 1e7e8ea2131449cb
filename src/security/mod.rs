//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound RPC attempt:
//!     → rate_limit.rs (sliding-window admission)
//!     → Pass to the transport
//! ```
//!
//! # Design Decisions
//! - Fail closed: an exhausted window rejects, it never queues
//! - One window per service instance, never persisted

pub mod rate_limit;

pub use rate_limit::RateLimiter;
