//! Candle builders and an exchange double shared by unit and integration tests.

use crate::error::ExchangeError;
use crate::exchange::ExchangeGateway;
use crate::models::{Candle, OpenPosition, OrderAck, OrderRequest, Precisions, Side};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// 15-minute candles whose open is the previous close
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let mut prev_close = closes.first().copied().unwrap_or_default();

    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = prev_close;
            prev_close = close;
            Candle {
                timestamp: start_time() + Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) * 1.002,
                low: open.min(close) * 0.998,
                close,
                volume: 1000.0,
                turnover: 1000.0 * close,
            }
        })
        .collect()
}

/// Piecewise-linear closes through `(index, price)` anchors
pub fn zigzag(anchors: &[(usize, f64)]) -> Vec<f64> {
    let mut closes = Vec::new();

    for pair in anchors.windows(2) {
        let (i0, p0) = pair[0];
        let (i1, p1) = pair[1];
        for i in i0..i1 {
            let t = (i - i0) as f64 / (i1 - i0) as f64;
            closes.push(p0 + (p1 - p0) * t);
        }
    }
    if let Some(&(_, last)) = anchors.last() {
        closes.push(last);
    }

    closes
}

/// Sideways chop between 100 and 102, then a close at 104 carrying `last_volume`
pub fn volume_spike(last_volume: f64) -> Vec<Candle> {
    let mut closes: Vec<f64> = (0..59)
        .map(|i| if i % 2 == 0 { 100.0 } else { 102.0 })
        .collect();
    closes.push(104.0);

    with_last_volume(candles_from_closes(&closes), last_volume)
}

/// Symmetrical triangle (highs 110/107/104, lows 90/93/96) broken upward at 106
pub fn triangle_breakout(last_volume: f64) -> Vec<Candle> {
    let closes = zigzag(&[
        (0, 100.0),
        (10, 110.0),
        (20, 90.0),
        (30, 107.0),
        (40, 93.0),
        (50, 104.0),
        (60, 96.0),
        (64, 100.0),
        (65, 106.0),
    ]);

    with_last_volume(candles_from_closes(&closes), last_volume)
}

fn with_last_volume(mut candles: Vec<Candle>, volume: f64) -> Vec<Candle> {
    if let Some(last) = candles.last_mut() {
        last.volume = volume;
        last.turnover = volume * last.close;
    }
    candles
}

/// In-memory exchange: scripted reads, recorded writes
pub struct MockGateway {
    candles: HashMap<String, Vec<Candle>>,
    mark_price: Option<f64>,
    precisions: Precisions,
    balance: Option<f64>,
    positions: Mutex<Option<Vec<OpenPosition>>>,
    reject_orders: bool,
    fill_opens_position: bool,
    orders: Mutex<Vec<OrderRequest>>,
    leverage_calls: Mutex<Vec<(String, u32)>>,
    balance_calls: AtomicUsize,
    candle_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            candles: HashMap::new(),
            mark_price: Some(100.0),
            precisions: Precisions {
                price: 2,
                quantity: 3,
            },
            balance: Some(1000.0),
            positions: Mutex::new(Some(Vec::new())),
            reject_orders: false,
            fill_opens_position: false,
            orders: Mutex::new(Vec::new()),
            leverage_calls: Mutex::new(Vec::new()),
            balance_calls: AtomicUsize::new(0),
            candle_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_mark_price(mut self, price: f64) -> Self {
        self.mark_price = Some(price);
        self
    }

    pub fn failing_mark_price(mut self) -> Self {
        self.mark_price = None;
        self
    }

    pub fn failing_balance(mut self) -> Self {
        self.balance = None;
        self
    }

    pub fn with_open_positions(self, count: usize) -> Self {
        let positions = (0..count)
            .map(|i| OpenPosition {
                symbol: format!("OPEN{}USDT", i),
                side: Some(Side::Buy),
                size: 1.0,
            })
            .collect();
        *self.positions.lock().unwrap() = Some(positions);
        self
    }

    pub fn failing_positions(self) -> Self {
        *self.positions.lock().unwrap() = None;
        self
    }

    pub fn rejecting_orders(mut self) -> Self {
        self.reject_orders = true;
        self
    }

    /// Every accepted order shows up as an open position afterwards
    pub fn fills_open_positions(mut self) -> Self {
        self.fill_opens_position = true;
        self
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn leverage_calls(&self) -> Vec<(String, u32)> {
        self.leverage_calls.lock().unwrap().clone()
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn candle_calls(&self) -> usize {
        self.candle_calls.load(Ordering::SeqCst)
    }
}

fn offline() -> ExchangeError {
    ExchangeError::Network("connection refused".to_string())
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    async fn candles(
        &self,
        symbol: &str,
        _interval: &str,
        _limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        self.candles
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))
    }

    async fn mark_price(&self, _symbol: &str) -> Result<f64, ExchangeError> {
        self.mark_price.ok_or_else(offline)
    }

    async fn precisions(&self, _symbol: &str) -> Result<Precisions, ExchangeError> {
        Ok(self.precisions)
    }

    async fn balance(&self) -> Result<f64, ExchangeError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance.ok_or_else(offline)
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, ExchangeError> {
        self.positions.lock().unwrap().clone().ok_or_else(offline)
    }

    async fn tradable_symbols(&self) -> Result<Vec<String>, ExchangeError> {
        Ok(self.candles.keys().cloned().collect())
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        self.leverage_calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), leverage));
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        if self.reject_orders {
            return Err(ExchangeError::Api {
                code: 110007,
                message: "ab not enough for new order".to_string(),
            });
        }

        self.orders.lock().unwrap().push(order.clone());
        if self.fill_opens_position {
            if let Some(positions) = self.positions.lock().unwrap().as_mut() {
                positions.push(OpenPosition {
                    symbol: order.symbol.clone(),
                    side: Some(order.side),
                    size: 1.0,
                });
            }
        }

        Ok(OrderAck {
            order_id: format!("order-{}", self.orders.lock().unwrap().len()),
            link_id: order.link_id.clone(),
        })
    }
}
