use crate::config::RiskConfig;
use crate::error::PlacementError;
use crate::exchange::ExchangeGateway;
use crate::models::{OrderAck, OrderRequest, Precisions, Side, TradeDecision};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Size a market order and its protective levels
///
/// - quantity = order_notional / mark, rounded to the quantity precision
/// - take profit = mark +/- target_distance * pattern_target_pct (buy/sell)
/// - stop loss = mark
///
/// All rounding is half-to-even at the venue's precision.
pub fn size_order(
    symbol: &str,
    side: Side,
    target_distance: f64,
    mark_price: f64,
    precisions: Precisions,
    risk: &RiskConfig,
) -> Result<OrderRequest, PlacementError> {
    if !(mark_price.is_finite() && mark_price > 0.0) {
        return Err(PlacementError::InvalidMarkPrice(mark_price));
    }
    let mark = Decimal::from_f64(mark_price).ok_or(PlacementError::InvalidMarkPrice(mark_price))?;

    let too_small = || PlacementError::QuantityTooSmall {
        notional: risk.order_notional,
        mark_price,
        precision: precisions.quantity,
    };
    let quantity = Decimal::from_f64(risk.order_notional)
        .and_then(|notional| notional.checked_div(mark))
        .map(|q| round(q, precisions.quantity))
        .filter(|q| *q > Decimal::ZERO)
        .ok_or_else(too_small)?;

    let offset = target_distance * risk.pattern_target_pct;
    let take_profit = match side {
        Side::Buy => mark_price + offset,
        Side::Sell => mark_price - offset,
    };
    let take_profit = Decimal::from_f64(take_profit)
        .map(|tp| round(tp, precisions.price))
        .filter(|tp| *tp > Decimal::ZERO)
        .ok_or(PlacementError::InvalidTakeProfit(take_profit))?;

    Ok(OrderRequest {
        symbol: symbol.to_string(),
        side,
        quantity,
        take_profit,
        stop_loss: round(mark, precisions.price),
        link_id: uuid::Uuid::new_v4().to_string(),
    })
}

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

/// Places one bounded-risk market order per trade decision
pub struct RiskPlacer {
    risk: RiskConfig,
    leveraged: Mutex<HashSet<String>>,
}

impl RiskPlacer {
    pub fn new(risk: RiskConfig) -> Self {
        Self {
            risk,
            leveraged: Mutex::new(HashSet::new()),
        }
    }

    /// Fetch precisions and mark price, apply leverage, size and submit
    pub async fn place(
        &self,
        gateway: &dyn ExchangeGateway,
        decision: &TradeDecision,
    ) -> Result<OrderAck, PlacementError> {
        let symbol = decision.symbol.as_str();

        let precisions = gateway
            .precisions(symbol)
            .await
            .map_err(PlacementError::DataFetch)?;
        let mark_price = gateway
            .mark_price(symbol)
            .await
            .map_err(PlacementError::DataFetch)?;

        let order = size_order(
            symbol,
            decision.side,
            decision.target_distance,
            mark_price,
            precisions,
            &self.risk,
        )?;

        self.ensure_leverage(gateway, symbol).await?;

        tracing::info!(
            "[{}] Placing {} order: qty {} @ ~{} (${:.2}) with target {} (stop {})",
            symbol,
            order.side.as_str().to_uppercase(),
            order.quantity,
            mark_price,
            order_value(&order),
            order.take_profit,
            order.stop_loss
        );

        let ack = gateway
            .place_order(&order)
            .await
            .map_err(PlacementError::Exchange)?;

        tracing::info!(
            "[{}] ✅ Order accepted: id {} (link {})",
            symbol,
            ack.order_id,
            ack.link_id
        );
        Ok(ack)
    }

    /// Set leverage once per symbol for the lifetime of the placer
    async fn ensure_leverage(
        &self,
        gateway: &dyn ExchangeGateway,
        symbol: &str,
    ) -> Result<(), PlacementError> {
        let mut leveraged = self.leveraged.lock().await;
        if leveraged.contains(symbol) {
            return Ok(());
        }

        gateway
            .set_leverage(symbol, self.risk.leverage)
            .await
            .map_err(PlacementError::Exchange)?;
        tracing::debug!("[{}] Leverage set to {}x", symbol, self.risk.leverage);

        leveraged.insert(symbol.to_string());
        Ok(())
    }
}

/// Notional value of an order at its stop price, for logging
pub fn order_value(order: &OrderRequest) -> f64 {
    (order.quantity * order.stop_loss).to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExchangeError;
    use crate::models::PatternKind;
    use crate::test_support::MockGateway;
    use rust_decimal_macros::dec;

    fn risk() -> RiskConfig {
        RiskConfig {
            leverage: 10,
            order_notional: 50.0,
            pattern_target_pct: 0.8,
        }
    }

    fn decision(side: Side, target: f64) -> TradeDecision {
        TradeDecision {
            symbol: "BTCUSDT".to_string(),
            side,
            target_distance: target,
            pattern: PatternKind::Wedge,
        }
    }

    const PRECISIONS: Precisions = Precisions {
        price: 2,
        quantity: 3,
    };

    #[test]
    fn test_buy_sizing() {
        let order = size_order("BTCUSDT", Side::Buy, 10.0, 100.0, PRECISIONS, &risk()).unwrap();

        assert_eq!(order.quantity, dec!(0.5));
        assert_eq!(order.take_profit, dec!(108));
        assert_eq!(order.stop_loss, dec!(100));
        assert_eq!(order.side, Side::Buy);
        assert!(!order.link_id.is_empty());
    }

    #[test]
    fn test_sell_sizing() {
        let order = size_order("BTCUSDT", Side::Sell, 10.0, 100.0, PRECISIONS, &risk()).unwrap();

        assert_eq!(order.take_profit, dec!(92));
        assert_eq!(order.stop_loss, dec!(100));
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // 50 / 80 = 0.625 -> 0.62 at 2 dp
        let precisions = Precisions {
            price: 1,
            quantity: 2,
        };
        let order = size_order("ETHUSDT", Side::Buy, 1.0, 80.0, precisions, &risk()).unwrap();
        assert_eq!(order.quantity, dec!(0.62));

        // 50 / 16 = 3.125 -> 3.12
        let order = size_order("ETHUSDT", Side::Buy, 1.0, 16.0, precisions, &risk()).unwrap();
        assert_eq!(order.quantity, dec!(3.12));
    }

    #[test]
    fn test_quantity_rounding_to_zero_is_rejected() {
        let precisions = Precisions {
            price: 1,
            quantity: 0,
        };
        let err = size_order("BTCUSDT", Side::Buy, 500.0, 60000.0, precisions, &risk()).unwrap_err();
        assert!(matches!(err, PlacementError::QuantityTooSmall { precision: 0, .. }));
    }

    #[test]
    fn test_invalid_mark_price_is_rejected() {
        for mark in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = size_order("BTCUSDT", Side::Buy, 1.0, mark, PRECISIONS, &risk()).unwrap_err();
            assert!(matches!(err, PlacementError::InvalidMarkPrice(_)));
        }
    }

    #[test]
    fn test_sell_target_below_zero_is_rejected() {
        let err = size_order("BTCUSDT", Side::Sell, 200.0, 100.0, PRECISIONS, &risk()).unwrap_err();
        assert!(matches!(err, PlacementError::InvalidTakeProfit(_)));
    }

    #[tokio::test]
    async fn test_place_submits_one_order_and_sets_leverage_once() {
        let gateway = MockGateway::new().with_mark_price(100.0);
        let placer = RiskPlacer::new(risk());

        placer.place(&gateway, &decision(Side::Buy, 10.0)).await.unwrap();
        placer.place(&gateway, &decision(Side::Buy, 10.0)).await.unwrap();

        let orders = gateway.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].quantity, dec!(0.5));
        assert_eq!(orders[0].take_profit, dec!(108));
        assert_ne!(orders[0].link_id, orders[1].link_id);
        assert_eq!(gateway.leverage_calls(), vec![("BTCUSDT".to_string(), 10)]);
    }

    #[tokio::test]
    async fn test_place_reports_data_fetch_failure() {
        let gateway = MockGateway::new().failing_mark_price();
        let placer = RiskPlacer::new(risk());

        let err = placer
            .place(&gateway, &decision(Side::Buy, 10.0))
            .await
            .unwrap_err();

        assert!(matches!(err, PlacementError::DataFetch(ExchangeError::Network(_))));
        assert!(gateway.orders().is_empty());
    }

    #[tokio::test]
    async fn test_place_reports_rejected_order() {
        let gateway = MockGateway::new().with_mark_price(100.0).rejecting_orders();
        let placer = RiskPlacer::new(risk());

        let err = placer
            .place(&gateway, &decision(Side::Sell, 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, PlacementError::Exchange(ExchangeError::Api { .. })));
    }

    #[test]
    fn test_order_value() {
        let order = size_order("BTCUSDT", Side::Buy, 10.0, 100.0, PRECISIONS, &risk()).unwrap();
        assert!((order_value(&order) - 50.0).abs() < 1e-9);
    }
}
