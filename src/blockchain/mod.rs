//! Stellar integration subsystem.
//!
//! # Data Flow
//! ```text
//! StellarService (service.rs)
//!     → address.rs (shape check, before any budget is spent)
//!     → contract.rs / events.rs / transaction.rs
//!         → RetryExecutor (deadline, classification, backoff)
//!             → RateLimiter (one shared sliding window)
//!                 → client.rs (Horizon REST, Soroban JSON-RPC)
//!     → value.rs (ScVal ⇄ NativeValue, invocation envelopes)
//! ```
//!
//! # Security Constraints
//! - Read-only: nothing is signed or submitted
//! - No key material; simulations use a placeholder source account

pub mod address;
pub mod client;
pub mod contract;
pub mod events;
pub mod service;
pub mod transaction;
pub mod types;
pub mod value;

pub use client::{HorizonApi, HorizonClient, RawContractEvent, SorobanApi, SorobanRpcClient};
pub use service::StellarService;
pub use transaction::MonitorOptions;
pub use types::{StellarError, StellarResult};
pub use value::NativeValue;
