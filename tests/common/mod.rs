// Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use patternbot::{
    Candle, ExchangeError, ExchangeGateway, OpenPosition, OrderAck, OrderRequest, Precisions, Side,
};
use std::collections::HashMap;
use std::sync::Mutex;

pub use patternbot::test_support::{candles_from_closes, triangle_breakout, zigzag};

/// Exchange double: scripted market data, recorded orders
pub struct InMemoryGateway {
    pub candles: HashMap<String, Vec<Candle>>,
    pub mark_price: f64,
    pub precisions: Precisions,
    pub open_positions: Mutex<Vec<OpenPosition>>,
    pub orders: Mutex<Vec<OrderRequest>>,
    pub leverage: Mutex<Vec<(String, u32)>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            candles: HashMap::new(),
            mark_price: 100.0,
            precisions: Precisions {
                price: 2,
                quantity: 3,
            },
            open_positions: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            leverage: Mutex::new(Vec::new()),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_open_position(self, symbol: &str) -> Self {
        self.open_positions.lock().unwrap().push(OpenPosition {
            symbol: symbol.to_string(),
            side: Some(Side::Buy),
            size: 1.0,
        });
        self
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeGateway for InMemoryGateway {
    async fn candles(
        &self,
        symbol: &str,
        _interval: &str,
        _limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        self.candles
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))
    }

    async fn mark_price(&self, _symbol: &str) -> Result<f64, ExchangeError> {
        Ok(self.mark_price)
    }

    async fn precisions(&self, _symbol: &str) -> Result<Precisions, ExchangeError> {
        Ok(self.precisions)
    }

    async fn balance(&self) -> Result<f64, ExchangeError> {
        Ok(1000.0)
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, ExchangeError> {
        Ok(self.open_positions.lock().unwrap().clone())
    }

    async fn tradable_symbols(&self) -> Result<Vec<String>, ExchangeError> {
        Ok(self.candles.keys().cloned().collect())
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        self.leverage
            .lock()
            .unwrap()
            .push((symbol.to_string(), leverage));
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(OrderAck {
            order_id: format!("mem-{}", self.orders.lock().unwrap().len()),
            link_id: order.link_id.clone(),
        })
    }
}
