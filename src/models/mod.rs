use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLCV candlestick, ordered oldest-first inside a series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub turnover: f64,
}

/// Order / signal direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Venue spelling ("Buy" / "Sell")
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heiken-Ashi trend direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// Chart pattern families, in the order the resolver consults them
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Wedge,
    DoubleBottomTop,
    HeadAndShoulders,
    SymmetricalTriangle,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Wedge => "wedge",
            PatternKind::DoubleBottomTop => "double_bottom_top",
            PatternKind::HeadAndShoulders => "head_and_shoulders",
            PatternKind::SymmetricalTriangle => "symmetrical_triangle",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired pattern: direction plus the projected move in price units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PatternSignal {
    pub pattern: PatternKind,
    pub side: Side,
    pub target_distance: f64,
}

impl PatternSignal {
    /// Returns None unless the target distance is finite and strictly positive
    pub fn new(pattern: PatternKind, side: Side, target_distance: f64) -> Option<Self> {
        if target_distance.is_finite() && target_distance > 0.0 {
            Some(Self {
                pattern,
                side,
                target_distance,
            })
        } else {
            None
        }
    }
}

/// Final per-symbol trade decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeDecision {
    pub symbol: String,
    pub side: Side,
    pub target_distance: f64,
    pub pattern: PatternKind,
}

/// Open position as reported by the venue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenPosition {
    pub symbol: String,
    pub side: Option<Side>,
    pub size: f64,
}

/// Decimal places the venue accepts for prices and quantities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Precisions {
    pub price: u32,
    pub quantity: u32,
}

/// Market order with protective levels attached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub link_id: String,
}

/// Venue acknowledgement of a submitted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub link_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_signal_rejects_non_positive_target() {
        assert!(PatternSignal::new(PatternKind::Wedge, Side::Buy, 0.0).is_none());
        assert!(PatternSignal::new(PatternKind::Wedge, Side::Buy, -1.5).is_none());
        assert!(PatternSignal::new(PatternKind::Wedge, Side::Buy, f64::NAN).is_none());

        let signal = PatternSignal::new(PatternKind::Wedge, Side::Sell, 2.5).unwrap();
        assert_eq!(signal.side, Side::Sell);
        assert_eq!(signal.target_distance, 2.5);
    }

    #[test]
    fn test_names() {
        assert_eq!(PatternKind::DoubleBottomTop.to_string(), "double_bottom_top");
        assert_eq!(Side::Sell.to_string(), "Sell");
    }
}
