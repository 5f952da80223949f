use crate::error::SignalError;
use crate::models::Candle;

/// Calculate average volume over the trailing `period` candles (current included)
pub fn calculate_average_volume(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let start_idx = candles.len() - period;
    let total_volume: f64 = candles[start_idx..].iter().map(|c| c.volume).sum();
    Some(total_volume / period as f64)
}

/// True iff the last candle's volume is strictly above its rolling average
pub fn volume_confirmation(candles: &[Candle], period: usize) -> Result<bool, SignalError> {
    let avg_volume =
        calculate_average_volume(candles, period).ok_or(SignalError::InsufficientData {
            indicator: "volume",
            required: period,
            available: candles.len(),
        })?;

    // average exists, so candles is non-empty
    Ok(candles[candles.len() - 1].volume > avg_volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candles_from_closes;

    fn with_volumes(volumes: &[f64]) -> Vec<Candle> {
        let mut candles = candles_from_closes(&vec![100.0; volumes.len()]);
        for (candle, &volume) in candles.iter_mut().zip(volumes) {
            candle.volume = volume;
        }
        candles
    }

    #[test]
    fn test_average_includes_current_candle() {
        let candles = with_volumes(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(calculate_average_volume(&candles, 2), Some(3.5));
        assert_eq!(calculate_average_volume(&candles, 4), Some(2.5));
    }

    #[test]
    fn test_volume_spike_confirms() {
        let mut volumes = vec![1000.0; 19];
        volumes.push(3000.0);
        assert_eq!(volume_confirmation(&with_volumes(&volumes), 20), Ok(true));
    }

    #[test]
    fn test_constant_volume_does_not_confirm() {
        let volumes = vec![1000.0; 20];
        assert_eq!(volume_confirmation(&with_volumes(&volumes), 20), Ok(false));
    }

    #[test]
    fn test_insufficient_data_is_reported() {
        let volumes = vec![1000.0; 5];
        let result = volume_confirmation(&with_volumes(&volumes), 20);
        assert_eq!(
            result,
            Err(SignalError::InsufficientData {
                indicator: "volume",
                required: 20,
                available: 5,
            })
        );
    }
}
