//! Stellar/Soroban integration client library

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod blockchain;

pub use blockchain::{StellarError, StellarResult, StellarService};
pub use config::schema::StellarConfig;
pub use lifecycle::Shutdown;
