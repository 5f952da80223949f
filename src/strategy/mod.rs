// Signal pipeline: pattern -> false-breakout filter -> Heiken-Ashi trend -> decision
pub mod confirmation;
pub mod resolver;

pub use confirmation::{ConfirmationFilter, ConfirmationReport};
pub use resolver::{NoTradeReason, Resolution, SignalResolver};
