use super::ExchangeGateway;
use crate::error::ExchangeError;
use crate::models::{Candle, OpenPosition, OrderAck, OrderRequest, Precisions};
use async_trait::async_trait;

/// Paper-trading wrapper: reads go to the inner gateway, writes are only logged
pub struct DryRunGateway<G> {
    inner: G,
}

impl<G: ExchangeGateway> DryRunGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

#[async_trait]
impl<G: ExchangeGateway> ExchangeGateway for DryRunGateway<G> {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        self.inner.candles(symbol, interval, limit).await
    }

    async fn mark_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        self.inner.mark_price(symbol).await
    }

    async fn precisions(&self, symbol: &str) -> Result<Precisions, ExchangeError> {
        self.inner.precisions(symbol).await
    }

    async fn balance(&self) -> Result<f64, ExchangeError> {
        self.inner.balance().await
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, ExchangeError> {
        self.inner.open_positions().await
    }

    async fn tradable_symbols(&self) -> Result<Vec<String>, ExchangeError> {
        self.inner.tradable_symbols().await
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        tracing::info!("🧪 [{}] Would set leverage to {}x", symbol, leverage);
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        tracing::info!(
            "🧪 [{}] Would {} {} (TP {}, SL {})",
            order.symbol,
            order.side.as_str().to_uppercase(),
            order.quantity,
            order.take_profit,
            order.stop_loss
        );

        Ok(OrderAck {
            order_id: format!("dry-run-{}", order.link_id),
            link_id: order.link_id.clone(),
        })
    }
}
