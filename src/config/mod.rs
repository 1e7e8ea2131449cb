//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file, then environment overrides)
//!     → validation.rs (semantic checks)
//!     → StellarConfig (validated, immutable)
//!     → shared via Arc by the service and its components
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; read once at construction
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::StellarConfig;
pub use schema::{
    EventQueryConfig, MonitorConfig, Network, ObservabilityConfig, RateLimitPolicy, RetryPolicy,
};
