use crate::error::SignalError;
use crate::indicators::{IndicatorConfig, IndicatorSnapshot};
use crate::models::Candle;

/// False-breakout filter
///
/// A pattern breakout is trusted only when all four checks agree at the last
/// candle: volume above its average, positive MACD histogram, close outside
/// the Bollinger Bands and RSI inside the neutral zone.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationFilter {
    config: IndicatorConfig,
}

/// Outcome of each confirmation check plus the values behind them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmationReport {
    pub volume: bool,
    pub macd: bool,
    pub bollinger: bool,
    pub rsi: bool,
    pub snapshot: IndicatorSnapshot,
}

impl ConfirmationReport {
    /// True iff every check passed
    pub fn accepted(&self) -> bool {
        self.volume && self.macd && self.bollinger && self.rsi
    }

    /// Names of the checks that did not pass
    pub fn failed_checks(&self) -> Vec<&'static str> {
        [
            ("volume", self.volume),
            ("macd", self.macd),
            ("bollinger", self.bollinger),
            ("rsi", self.rsi),
        ]
        .into_iter()
        .filter(|(_, passed)| !passed)
        .map(|(name, _)| name)
        .collect()
    }
}

impl ConfirmationFilter {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn confirm(&self, candles: &[Candle]) -> Result<ConfirmationReport, SignalError> {
        let snapshot = IndicatorSnapshot::compute(candles, &self.config)?;

        tracing::debug!(
            "Indicators: close={:.4} vol={:.2}/{:.2} macd_hist={:.5} bb=[{:.4}, {:.4}] rsi={:.2}",
            snapshot.last_close,
            snapshot.last_volume,
            snapshot.volume_average,
            snapshot.macd.histogram,
            snapshot.bollinger.lower,
            snapshot.bollinger.upper,
            snapshot.rsi
        );

        Ok(ConfirmationReport {
            volume: snapshot.volume_confirmed(),
            macd: snapshot.macd_confirmed(),
            bollinger: snapshot.bollinger_confirmed(),
            rsi: snapshot.rsi_confirmed(),
            snapshot,
        })
    }
}
