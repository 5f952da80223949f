use super::confirmation::ConfirmationFilter;
use crate::config::BotConfig;
use crate::error::ExchangeError;
use crate::exchange::ExchangeGateway;
use crate::indicators::{heiken_ashi, heiken_ashi_trend};
use crate::models::{Candle, Side, TradeDecision, Trend};
use crate::patterns::{default_detectors, PatternDetector};
use std::fmt;

/// Why a symbol produced no trade this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoTradeReason {
    /// No detector recognised a pattern
    NoPattern,
    /// A pattern fired but the confirmation filter rejected it
    FalseBreakout,
    /// Heiken-Ashi trend disagrees with the pattern direction
    TrendMismatch,
    /// Too little history to run the confirmation indicators
    InsufficientData,
}

impl fmt::Display for NoTradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoTradeReason::NoPattern => "no pattern",
            NoTradeReason::FalseBreakout => "false breakout",
            NoTradeReason::TrendMismatch => "trend mismatch",
            NoTradeReason::InsufficientData => "insufficient data",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Trade(TradeDecision),
    NoTrade(NoTradeReason),
}

impl Resolution {
    pub fn decision(&self) -> Option<&TradeDecision> {
        match self {
            Resolution::Trade(decision) => Some(decision),
            Resolution::NoTrade(_) => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Trade(d) => write!(
                f,
                "{} {} ({}, target {:.6})",
                d.side, d.symbol, d.pattern, d.target_distance
            ),
            Resolution::NoTrade(reason) => write!(f, "no trade: {}", reason),
        }
    }
}

/// Turns a candle series into at most one trade decision
///
/// Detectors are consulted in order and the first one that fires decides the
/// outcome; a rejected breakout never falls through to later detectors.
pub struct SignalResolver {
    detectors: Vec<Box<dyn PatternDetector>>,
    filter: ConfirmationFilter,
    interval: String,
    candle_limit: usize,
}

impl SignalResolver {
    pub fn new(config: &BotConfig) -> Self {
        Self::with_detectors(default_detectors(&config.patterns), config)
    }

    /// Resolver with a custom detector list (same order semantics)
    pub fn with_detectors(detectors: Vec<Box<dyn PatternDetector>>, config: &BotConfig) -> Self {
        Self {
            detectors,
            filter: ConfirmationFilter::new(config.indicators.clone()),
            interval: config.trading.interval(),
            candle_limit: config.trading.candle_limit,
        }
    }

    /// Fetch history for `symbol` and resolve it
    ///
    /// A fetch failure is returned as an error and never folded into a
    /// `NoTrade` outcome.
    pub async fn resolve(
        &self,
        gateway: &dyn ExchangeGateway,
        symbol: &str,
    ) -> Result<Resolution, ExchangeError> {
        let candles = gateway
            .candles(symbol, &self.interval, self.candle_limit)
            .await?;
        Ok(self.resolve_series(symbol, &candles))
    }

    pub fn resolve_series(&self, symbol: &str, candles: &[Candle]) -> Resolution {
        let ha = heiken_ashi(candles);

        let Some(signal) = self.detectors.iter().find_map(|d| d.detect(candles)) else {
            tracing::debug!("[{}] No pattern detected", symbol);
            return Resolution::NoTrade(NoTradeReason::NoPattern);
        };

        tracing::info!(
            "[{}] {} detected. Signal: {}",
            symbol,
            signal.pattern,
            signal.side
        );

        let report = match self.filter.confirm(candles) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("[{}] Cannot confirm {}: {}", symbol, signal.pattern, e);
                return Resolution::NoTrade(NoTradeReason::InsufficientData);
            }
        };

        if !report.accepted() {
            tracing::info!(
                "[{}] False breakout detected (failed: {}). Ignoring the signal.",
                symbol,
                report.failed_checks().join(", ")
            );
            return Resolution::NoTrade(NoTradeReason::FalseBreakout);
        }

        match (signal.side, heiken_ashi_trend(&ha)) {
            (Side::Buy, Trend::Bullish) => {
                tracing::info!("[{}] Bullish trend confirmed by Heiken Ashi", symbol)
            }
            (Side::Sell, Trend::Bearish) => {
                tracing::info!("[{}] Bearish trend confirmed by Heiken Ashi", symbol)
            }
            (side, trend) => {
                tracing::info!(
                    "[{}] Heiken Ashi trend {:?} conflicts with {} signal. Ignoring the signal.",
                    symbol,
                    trend,
                    side
                );
                return Resolution::NoTrade(NoTradeReason::TrendMismatch);
            }
        }

        Resolution::Trade(TradeDecision {
            symbol: symbol.to_string(),
            side: signal.side,
            target_distance: signal.target_distance,
            pattern: signal.pattern,
        })
    }
}
