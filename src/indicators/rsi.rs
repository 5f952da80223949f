use crate::error::SignalError;
use crate::models::Candle;

/// Lower bound of the neutral RSI zone (exclusive)
pub const RSI_OVERSOLD: f64 = 30.0;
/// Upper bound of the neutral RSI zone (exclusive)
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Calculate Relative Strength Index (RSI)
///
/// Uses Wilder's smoothing (`alpha = 1 / period`) seeded with the first
/// price change, so the value depends on the whole series, not only the
/// trailing window.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, window) in prices.windows(2).enumerate() {
        let change = window[1] - window[0];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i == 0 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        }
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// True iff RSI is strictly inside (30, 70)
pub fn rsi_in_neutral_zone(rsi: f64) -> bool {
    rsi > RSI_OVERSOLD && rsi < RSI_OVERBOUGHT
}

/// "RSI divergence" gate used by the confirmation filter.
///
/// Despite the name this does not look for price/RSI divergence: it passes
/// only when the latest RSI sits outside the overbought/oversold extremes.
pub fn rsi_divergence(candles: &[Candle], period: usize) -> Result<bool, SignalError> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let rsi = calculate_rsi(&closes, period).ok_or(SignalError::InsufficientData {
        indicator: "rsi",
        required: period + 1,
        available: candles.len(),
    })?;

    Ok(rsi_in_neutral_zone(rsi))
}
