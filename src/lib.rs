// Core modules
pub mod config;
pub mod error;
pub mod exchange;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod patterns;
pub mod strategy;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_support;

// Re-export commonly used types
pub use config::BotConfig;
pub use error::{ConfigError, ExchangeError, PlacementError, SignalError};
pub use exchange::ExchangeGateway;
pub use models::*;
pub use strategy::{Resolution, SignalResolver};
