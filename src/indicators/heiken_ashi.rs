//! Heiken-Ashi candles
//!
//! Smoothed candles used only to read the trend direction.

use crate::models::{Candle, Trend};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeikenAshiCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Transform a candle series into Heiken-Ashi candles (same length, same order)
///
/// - close = (O + H + L + C) / 4
/// - open  = (previous HA open + previous HA close) / 2, first candle seeded with (O + C) / 2
/// - high  = max(O, C, H), low = min(O, C, L) of the source candle
pub fn heiken_ashi(candles: &[Candle]) -> Vec<HeikenAshiCandle> {
    let mut ha: Vec<HeikenAshiCandle> = Vec::with_capacity(candles.len());

    for candle in candles {
        let close = (candle.open + candle.high + candle.low + candle.close) / 4.0;
        let open = match ha.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (candle.open + candle.close) / 2.0,
        };

        ha.push(HeikenAshiCandle {
            open,
            high: candle.open.max(candle.close).max(candle.high),
            low: candle.open.min(candle.close).min(candle.low),
            close,
        });
    }

    ha
}

/// Trend of the last Heiken-Ashi candle
pub fn heiken_ashi_trend(ha: &[HeikenAshiCandle]) -> Trend {
    match ha.last() {
        Some(last) if last.close > last.open => Trend::Bullish,
        Some(last) if last.close < last.open => Trend::Bearish,
        _ => Trend::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn candle(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(15 * i),
            open,
            high,
            low,
            close,
            volume: 1000.0,
            turnover: 1000.0 * close,
        }
    }

    fn assert_open_recurrence(ha: &[HeikenAshiCandle]) {
        for i in 1..ha.len() {
            assert_eq!(ha[i].open, (ha[i - 1].open + ha[i - 1].close) / 2.0);
        }
    }

    #[test]
    fn test_first_candle_seed() {
        let ha = heiken_ashi(&[candle(0, 10.0, 14.0, 8.0, 12.0)]);
        assert_eq!(ha[0].open, 11.0);
        assert_eq!(ha[0].close, 11.0);
        assert_eq!(ha[0].high, 14.0);
        assert_eq!(ha[0].low, 8.0);
    }

    #[test]
    fn test_open_recurrence_on_monotonic_series() {
        let candles: Vec<Candle> = (0..100)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(i, base, base + 1.5, base - 0.5, base + 1.0)
            })
            .collect();

        let ha = heiken_ashi(&candles);
        assert_eq!(ha.len(), candles.len());
        assert_open_recurrence(&ha);
        assert_eq!(heiken_ashi_trend(&ha), Trend::Bullish);
    }

    #[test]
    fn test_open_recurrence_on_random_series() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut price: f64 = 250.0;
        let candles: Vec<Candle> = (0..500)
            .map(|i| {
                let open = price;
                price *= 1.0 + rng.gen_range(-0.02..0.02);
                let high = open.max(price) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(price) * (1.0 - rng.gen_range(0.0..0.01));
                candle(i, open, high, low, price)
            })
            .collect();

        let ha = heiken_ashi(&candles);
        assert_open_recurrence(&ha);
        for (h, c) in ha.iter().zip(candles.iter()) {
            assert!(h.high >= c.high && h.low <= c.low);
        }
    }

    #[test]
    fn test_trend_directions() {
        let falling: Vec<Candle> = (0..10)
            .map(|i| {
                let base = 100.0 - i as f64;
                candle(i, base, base + 0.5, base - 1.5, base - 1.0)
            })
            .collect();
        assert_eq!(heiken_ashi_trend(&heiken_ashi(&falling)), Trend::Bearish);

        let flat = vec![candle(0, 10.0, 10.0, 10.0, 10.0); 5];
        assert_eq!(heiken_ashi_trend(&heiken_ashi(&flat)), Trend::Neutral);

        assert_eq!(heiken_ashi_trend(&[]), Trend::Neutral);
    }
}
