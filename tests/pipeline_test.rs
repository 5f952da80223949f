mod common;

use common::{candles_from_closes, triangle_breakout, InMemoryGateway};
use patternbot::exchange::{DryRunGateway, ExchangeGateway};
use patternbot::execution::{CycleOutcome, TradingLoop};
use patternbot::patterns::PatternDetector;
use patternbot::strategy::NoTradeReason;
use patternbot::{BotConfig, Candle, PatternKind, PatternSignal, Resolution, Side, SignalResolver};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn config(max_positions: usize) -> BotConfig {
    let mut config = BotConfig::default();
    config.trading.max_positions = max_positions;
    config.trading.cycle_delay_secs = 0;
    config.trading.post_order_delay_secs = 0;
    config
}

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_confirmed_breakout_places_one_bounded_order() {
    let _ = tracing_subscriber::fmt::try_init();

    let gateway = Arc::new(InMemoryGateway::new().with_candles("BTCUSDT", triangle_breakout(3000.0)));
    let trading = TradingLoop::new(gateway.clone(), &config(50));

    let report = trading.run_cycle(&symbols(&["BTCUSDT"])).await;
    assert_eq!(report.outcome, CycleOutcome::Completed);
    assert_eq!(report.orders_placed, 1);

    let orders = gateway.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.side, Side::Buy);
    // 50 USDT at mark 100
    assert_eq!(order.quantity, dec!(0.5));
    // 100 + 21.5 * 0.8
    assert_eq!(order.take_profit, dec!(117.2));
    assert_eq!(order.stop_loss, dec!(100));

    assert_eq!(
        gateway.leverage.lock().unwrap().clone(),
        vec![("BTCUSDT".to_string(), 10)]
    );
}

#[tokio::test]
async fn test_cap_of_one_with_one_open_places_nothing() {
    let gateway = Arc::new(
        InMemoryGateway::new()
            .with_candles("BTCUSDT", triangle_breakout(3000.0))
            .with_open_position("ETHUSDT"),
    );
    let trading = TradingLoop::new(gateway.clone(), &config(1));

    let report = trading.run_cycle(&symbols(&["BTCUSDT"])).await;

    assert_eq!(report.outcome, CycleOutcome::PositionCapReached);
    assert!(gateway.orders().is_empty());
    assert!(gateway.leverage.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_silent_detectors_mean_no_order_and_no_error() {
    let closes: Vec<f64> = (0..300).map(|i| 100.0 + (i % 2) as f64 * 0.01).collect();
    let gateway = Arc::new(InMemoryGateway::new().with_candles("XRPUSDT", candles_from_closes(&closes)));
    let trading = TradingLoop::new(gateway.clone(), &config(50));

    let report = trading.run_cycle(&symbols(&["XRPUSDT"])).await;

    assert_eq!(report.outcome, CycleOutcome::Completed);
    assert_eq!(report.decisions, 0);
    assert_eq!(report.fetch_errors, 0);
    assert_eq!(report.order_failures, 0);
    assert!(gateway.orders().is_empty());
}

#[tokio::test]
async fn test_breakout_without_volume_is_not_traded() {
    let gateway = InMemoryGateway::new().with_candles("BTCUSDT", triangle_breakout(1000.0));
    let resolver = SignalResolver::new(&BotConfig::default());

    let resolution = resolver.resolve(&gateway, "BTCUSDT").await.unwrap();
    assert_eq!(resolution, Resolution::NoTrade(NoTradeReason::FalseBreakout));
}

#[tokio::test]
async fn test_fetch_error_is_distinct_from_no_trade() {
    let gateway = InMemoryGateway::new();
    let resolver = SignalResolver::new(&BotConfig::default());

    assert!(resolver.resolve(&gateway, "UNKNOWNUSDT").await.is_err());
}

struct CountingDetector {
    kind: PatternKind,
    side: Option<Side>,
    calls: Arc<AtomicUsize>,
}

impl PatternDetector for CountingDetector {
    fn kind(&self) -> PatternKind {
        self.kind
    }

    fn detect(&self, _candles: &[Candle]) -> Option<PatternSignal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.side
            .and_then(|side| PatternSignal::new(self.kind, side, 4.0))
    }
}

#[test]
fn test_first_firing_detector_decides() {
    let calls: Vec<Arc<AtomicUsize>> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let plan = [
        (PatternKind::Wedge, None),
        (PatternKind::DoubleBottomTop, None),
        (PatternKind::HeadAndShoulders, Some(Side::Buy)),
        (PatternKind::SymmetricalTriangle, Some(Side::Sell)),
    ];
    let detectors: Vec<Box<dyn PatternDetector>> = plan
        .iter()
        .zip(&calls)
        .map(|(&(kind, side), calls)| {
            Box::new(CountingDetector {
                kind,
                side,
                calls: calls.clone(),
            }) as Box<dyn PatternDetector>
        })
        .collect();

    let resolver = SignalResolver::with_detectors(detectors, &BotConfig::default());
    let resolution = resolver.resolve_series("BTCUSDT", &triangle_breakout(3000.0));

    let decision = resolution.decision().expect("expected a trade");
    assert_eq!(decision.pattern, PatternKind::HeadAndShoulders);
    assert_eq!(decision.side, Side::Buy);

    let counts: Vec<usize> = calls.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    assert_eq!(counts, vec![1, 1, 1, 0]);
}

#[tokio::test]
async fn test_dry_run_never_forwards_orders() {
    let dry_run = DryRunGateway::new(InMemoryGateway::new());
    let order = patternbot::execution::size_order(
        "BTCUSDT",
        Side::Sell,
        10.0,
        100.0,
        dry_run.precisions("BTCUSDT").await.unwrap(),
        &BotConfig::default().risk,
    )
    .unwrap();

    dry_run.set_leverage("BTCUSDT", 10).await.unwrap();
    let ack = dry_run.place_order(&order).await.unwrap();
    assert_eq!(ack.link_id, order.link_id);

    let inner = dry_run.into_inner();
    assert!(inner.orders().is_empty());
    assert!(inner.leverage.lock().unwrap().is_empty());
}
