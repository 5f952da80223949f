use super::pivots::{crossed_above, crossed_below, Channel};
use super::{closes, PatternConfig, PatternDetector};
use crate::models::{Candle, PatternKind, PatternSignal, Side};

/// Rising / falling wedge
///
/// Both trend lines slope the same way and converge. A rising wedge breaking
/// down through its lower line is a sell; a falling wedge breaking up through
/// its upper line is a buy. The target is the wedge's height at its widest
/// point (the oldest pivot used).
#[derive(Debug, Clone, Default)]
pub struct WedgeDetector {
    config: PatternConfig,
}

impl WedgeDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }
}

impl PatternDetector for WedgeDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Wedge
    }

    fn detect(&self, candles: &[Candle]) -> Option<PatternSignal> {
        let closes = closes(candles);
        let now = closes.len().checked_sub(1)?;
        let prev = now.checked_sub(1)?;

        let pivots = self.config.pivots(&closes);
        let channel = Channel::fit(&pivots, self.config.min_pivots, 3)?;
        if !channel.is_converging(now) {
            return None;
        }

        let (upper, lower) = (channel.upper, channel.lower);
        let height = channel.width_at(channel.start);

        let rising = upper.slope > 0.0 && lower.slope > upper.slope;
        let falling = lower.slope < 0.0 && upper.slope < lower.slope;

        if rising && crossed_below(&closes, lower.value_at(prev), lower.value_at(now)) {
            tracing::debug!(
                "Rising wedge breakdown: close {:.4} < support {:.4}, height {:.4}",
                closes[now],
                lower.value_at(now),
                height
            );
            return PatternSignal::new(PatternKind::Wedge, Side::Sell, height);
        }

        if falling && crossed_above(&closes, upper.value_at(prev), upper.value_at(now)) {
            tracing::debug!(
                "Falling wedge breakout: close {:.4} > resistance {:.4}, height {:.4}",
                closes[now],
                upper.value_at(now),
                height
            );
            return PatternSignal::new(PatternKind::Wedge, Side::Buy, height);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candles_from_closes, zigzag};

    fn detector() -> WedgeDetector {
        WedgeDetector::new(PatternConfig::default())
    }

    #[test]
    fn test_rising_wedge_breakdown_sells() {
        // highs 110 -> 116 -> 120, lows 100 -> 109 -> 115, then a drop through support
        let closes = zigzag(&[
            (0, 95.0),
            (10, 110.0),
            (20, 100.0),
            (30, 116.0),
            (40, 109.0),
            (50, 120.0),
            (60, 115.0),
            (64, 118.0),
            (65, 112.0),
        ]);
        let signal = detector().detect(&candles_from_closes(&closes)).unwrap();

        assert_eq!(signal.pattern, PatternKind::Wedge);
        assert_eq!(signal.side, Side::Sell);
        // upper line 0.25x + 107.83, lower line 0.375x + 93.0, widest at index 10
        assert!((signal.target_distance - 13.583_333_333).abs() < 1e-6);
    }

    #[test]
    fn test_falling_wedge_breakout_buys() {
        // highs 120 -> 112 -> 108, lows 100 -> 96 -> 94, then a push through resistance
        let closes = zigzag(&[
            (0, 110.0),
            (10, 120.0),
            (20, 100.0),
            (30, 112.0),
            (40, 96.0),
            (50, 108.0),
            (60, 94.0),
            (64, 97.0),
            (65, 103.0),
        ]);
        let signal = detector().detect(&candles_from_closes(&closes)).unwrap();

        assert_eq!(signal.side, Side::Buy);
        assert!(signal.target_distance > 0.0);
    }

    #[test]
    fn test_wedge_without_breakout_is_silent() {
        let closes = zigzag(&[
            (0, 95.0),
            (10, 110.0),
            (20, 100.0),
            (30, 116.0),
            (40, 109.0),
            (50, 120.0),
            (60, 115.0),
            (64, 118.5),
        ]);
        assert!(detector().detect(&candles_from_closes(&closes)).is_none());
    }

    #[test]
    fn test_parallel_channel_is_not_a_wedge() {
        let closes = zigzag(&[
            (0, 95.0),
            (10, 110.0),
            (20, 100.0),
            (30, 120.0),
            (40, 110.0),
            (50, 130.0),
            (60, 120.0),
            (64, 123.0),
            (65, 100.0),
        ]);
        assert!(detector().detect(&candles_from_closes(&closes)).is_none());
    }
}
