// Exchange collaborator
// Market data, account reads and order submission behind one async trait so
// the pipeline can run against the live venue, a dry-run wrapper or a test double.

pub mod bybit;
pub mod dry_run;

pub use bybit::BybitClient;
pub use dry_run::DryRunGateway;

use crate::error::ExchangeError;
use crate::models::{Candle, OpenPosition, OrderAck, OrderRequest, Precisions};
use async_trait::async_trait;

#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Up to `limit` candles of `interval` minutes, oldest first
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError>;

    async fn mark_price(&self, symbol: &str) -> Result<f64, ExchangeError>;

    /// Decimal places accepted for price and quantity
    async fn precisions(&self, symbol: &str) -> Result<Precisions, ExchangeError>;

    /// USDT wallet balance
    async fn balance(&self) -> Result<f64, ExchangeError>;

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, ExchangeError>;

    /// USDT-settled perpetuals, in venue order
    async fn tradable_symbols(&self) -> Result<Vec<String>, ExchangeError>;

    /// Set leverage for both sides; an unchanged value counts as success
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError>;

    /// Submit a market order with take-profit and stop-loss attached
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError>;
}

/// Number of positions with a non-zero size
pub fn count_open(positions: &[OpenPosition]) -> usize {
    positions.iter().filter(|p| p.size != 0.0).count()
}
