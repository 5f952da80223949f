/// Calculate Simple Moving Average (SMA) over the trailing `period` values
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let sum: f64 = values.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Calculate the latest Exponential Moving Average (EMA)
pub fn calculate_ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    ema_series(values, period).last().copied()
}

/// Full EMA series with `alpha = 2 / (period + 1)`, seeded with the first value.
///
/// The output is aligned with the input (same length). Callers decide how many
/// leading values to treat as warm-up.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema = first;
    let mut series = Vec::with_capacity(values.len());
    series.push(ema);

    for value in &values[1..] {
        ema = alpha * value + (1.0 - alpha) * ema;
        series.push(ema);
    }

    series
}

/// Population standard deviation of the trailing `period` values
pub fn standard_deviation(values: &[f64], period: usize) -> Option<f64> {
    let mean = calculate_sma(values, period)?;
    let window = &values[values.len() - period..];

    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
    Some(variance.sqrt())
}
