//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Ctrl-C → Shutdown::trigger → broadcast → monitor_transaction_until → pending
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
