// Order sizing/placement and the trading loop
pub mod placer;
pub mod trading_loop;

pub use placer::{size_order, RiskPlacer};
pub use trading_loop::{CycleOutcome, CycleReport, TradingLoop};
