use super::pivots::{crossed_above, crossed_below, Channel};
use super::{closes, PatternConfig, PatternDetector};
use crate::models::{Candle, PatternKind, PatternSignal, Side};

/// Symmetrical triangle: lower highs against higher lows
///
/// Direction comes from the breakout side. Target is the triangle's height at
/// its widest point.
#[derive(Debug, Clone, Default)]
pub struct SymmetricalTriangleDetector {
    config: PatternConfig,
}

impl SymmetricalTriangleDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }
}

impl PatternDetector for SymmetricalTriangleDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::SymmetricalTriangle
    }

    fn detect(&self, candles: &[Candle]) -> Option<PatternSignal> {
        let closes = closes(candles);
        let now = closes.len().checked_sub(1)?;
        let prev = now.checked_sub(1)?;

        let pivots = self.config.pivots(&closes);
        let channel = Channel::fit(&pivots, self.config.min_pivots, 3)?;
        let (upper, lower) = (channel.upper, channel.lower);

        if !(upper.slope < 0.0 && lower.slope > 0.0) || !channel.is_converging(now) {
            return None;
        }

        let height = channel.width_at(channel.start);

        if crossed_above(&closes, upper.value_at(prev), upper.value_at(now)) {
            return PatternSignal::new(PatternKind::SymmetricalTriangle, Side::Buy, height);
        }
        if crossed_below(&closes, lower.value_at(prev), lower.value_at(now)) {
            return PatternSignal::new(PatternKind::SymmetricalTriangle, Side::Sell, height);
        }

        None
    }
}
