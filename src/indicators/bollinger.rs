use super::moving_average::{calculate_sma, standard_deviation};
use crate::error::SignalError;
use crate::models::Candle;

/// Bollinger envelope at the last close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// True iff `price` is strictly above the upper or strictly below the lower band
    pub fn is_breakout(&self, price: f64) -> bool {
        price > self.upper || price < self.lower
    }
}

/// Calculate Bollinger Bands over the trailing `period` values
///
/// Middle band is the SMA; the bands sit `num_std` population standard
/// deviations away from it.
pub fn calculate_bollinger(prices: &[f64], period: usize, num_std: f64) -> Option<BollingerBands> {
    let middle = calculate_sma(prices, period)?;
    let std_dev = standard_deviation(prices, period)?;

    Some(BollingerBands {
        upper: middle + num_std * std_dev,
        middle,
        lower: middle - num_std * std_dev,
    })
}

/// True iff the last close broke out of the Bollinger envelope
pub fn bollinger_band_confirmation(
    candles: &[Candle],
    period: usize,
    num_std: f64,
) -> Result<bool, SignalError> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let bands = calculate_bollinger(&closes, period, num_std).ok_or(
        SignalError::InsufficientData {
            indicator: "bollinger",
            required: period,
            available: candles.len(),
        },
    )?;

    // closes is non-empty once the bands exist
    Ok(bands.is_breakout(closes[closes.len() - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_on_known_window() {
        let prices = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = calculate_bollinger(&prices, 8, 2.0).unwrap();
        assert_eq!(bands.middle, 5.0);
        assert_eq!(bands.upper, 9.0);
        assert_eq!(bands.lower, 1.0);
    }

    #[test]
    fn test_boundary_equality_is_not_a_breakout() {
        let bands = BollingerBands {
            upper: 9.0,
            middle: 5.0,
            lower: 1.0,
        };
        assert!(!bands.is_breakout(9.0));
        assert!(!bands.is_breakout(1.0));
        assert!(bands.is_breakout(9.0001));
        assert!(bands.is_breakout(0.9999));
        assert!(!bands.is_breakout(5.0));
    }

    #[test]
    fn test_flat_window_never_breaks_out() {
        // zero deviation: close equals both bands
        let prices = vec![10.0; 20];
        let bands = calculate_bollinger(&prices, 20, 2.0).unwrap();
        assert!(!bands.is_breakout(10.0));
    }

    #[test]
    fn test_insufficient_data() {
        let prices = vec![1.0; 19];
        assert!(calculate_bollinger(&prices, 20, 2.0).is_none());
    }
}
