//! Moving Average Convergence Divergence (MACD)
//!
//! MACD line = EMA(fast) - EMA(slow), signal line = EMA(signal) of the MACD
//! line, histogram = MACD line - signal line.

use super::moving_average::ema_series;
use crate::error::SignalError;
use crate::models::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Closes needed before the histogram has a defined value
pub fn macd_required_len(slow: usize, signal: usize) -> usize {
    (slow + signal).saturating_sub(1)
}

/// Calculate MACD at the last close
///
/// Both price EMAs are seeded with the first close. The MACD line is only
/// considered defined once the slow EMA has `slow` observations, and the
/// signal EMA is seeded with that first defined MACD value.
pub fn calculate_macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    if fast == 0 || slow == 0 || signal == 0 || prices.len() < macd_required_len(slow, signal) {
        return None;
    }

    let fast_ema = ema_series(prices, fast);
    let slow_ema = ema_series(prices, slow);

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .skip(slow - 1)
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_series(&macd_line, signal);

    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;

    Some(MacdValue {
        macd,
        signal,
        histogram: macd - signal,
    })
}

/// True iff the MACD histogram at the last candle is strictly positive
pub fn macd_confirmation(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<bool, SignalError> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let value = calculate_macd(&closes, fast, slow, signal).ok_or(SignalError::InsufficientData {
        indicator: "macd",
        required: macd_required_len(slow, signal),
        available: candles.len(),
    })?;

    Ok(value.histogram > 0.0)
}
