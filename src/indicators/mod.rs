// Technical indicators module
// Heiken-Ashi, volume baseline, MACD, Bollinger Bands and RSI.
// Every rolling window ends at, and includes, the most recent candle.

pub mod bollinger;
pub mod heiken_ashi;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod volume;

pub use bollinger::{bollinger_band_confirmation, calculate_bollinger, BollingerBands};
pub use heiken_ashi::{heiken_ashi, heiken_ashi_trend, HeikenAshiCandle};
pub use macd::{calculate_macd, macd_confirmation, macd_required_len, MacdValue};
pub use moving_average::{calculate_ema, calculate_sma, ema_series, standard_deviation};
pub use rsi::{calculate_rsi, rsi_divergence, rsi_in_neutral_zone};
pub use volume::{calculate_average_volume, volume_confirmation};

use crate::error::SignalError;
use crate::models::Candle;
use serde::{Deserialize, Serialize};

/// Indicator windows used by the confirmation filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub volume_window: usize,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            volume_window: 20,
            bollinger_window: 20,
            bollinger_std: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// Longest lookback any indicator needs
    pub fn min_candles_required(&self) -> usize {
        self.volume_window
            .max(self.bollinger_window)
            .max(macd_required_len(self.macd_slow, self.macd_signal))
            .max(self.rsi_period + 1)
    }
}

/// Point-in-time indicator values at the last candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub last_close: f64,
    pub last_volume: f64,
    pub volume_average: f64,
    pub macd: MacdValue,
    pub bollinger: BollingerBands,
    pub rsi: f64,
}

impl IndicatorSnapshot {
    /// Compute every indicator from scratch for the given series
    pub fn compute(candles: &[Candle], config: &IndicatorConfig) -> Result<Self, SignalError> {
        let required = config.min_candles_required();
        let insufficient = |indicator: &'static str| SignalError::InsufficientData {
            indicator,
            required,
            available: candles.len(),
        };

        let last = candles.last().ok_or_else(|| insufficient("snapshot"))?;
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let volume_average = calculate_average_volume(candles, config.volume_window)
            .ok_or_else(|| insufficient("volume"))?;
        let macd = calculate_macd(
            &closes,
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        )
        .ok_or_else(|| insufficient("macd"))?;
        let bollinger = calculate_bollinger(&closes, config.bollinger_window, config.bollinger_std)
            .ok_or_else(|| insufficient("bollinger"))?;
        let rsi = calculate_rsi(&closes, config.rsi_period).ok_or_else(|| insufficient("rsi"))?;

        Ok(Self {
            last_close: last.close,
            last_volume: last.volume,
            volume_average,
            macd,
            bollinger,
            rsi,
        })
    }

    pub fn volume_confirmed(&self) -> bool {
        self.last_volume > self.volume_average
    }

    pub fn macd_confirmed(&self) -> bool {
        self.macd.histogram > 0.0
    }

    pub fn bollinger_confirmed(&self) -> bool {
        self.bollinger.is_breakout(self.last_close)
    }

    pub fn rsi_confirmed(&self) -> bool {
        rsi_in_neutral_zone(self.rsi)
    }
}
