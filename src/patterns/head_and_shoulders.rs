use super::pivots::{crossed_above, crossed_below, relative_gap, Pivot, Pivots};
use super::{closes, PatternConfig, PatternDetector};
use crate::models::{Candle, PatternKind, PatternSignal, Side};

/// Head and shoulders (sell) and its inverse (buy)
///
/// Uses the last three swing highs (lows for the inverse): the middle one must
/// stand out from two comparable shoulders. The neckline is the lower of the
/// two troughs between them (higher of the two peaks for the inverse);
/// target = distance from head to neckline.
#[derive(Debug, Clone, Default)]
pub struct HeadAndShouldersDetector {
    config: PatternConfig,
}

impl HeadAndShouldersDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Shoulders within tolerance of each other, head beyond both by more than tolerance
    fn is_formation(&self, left: f64, head: f64, right: f64, inverted: bool) -> bool {
        let tolerance = self.config.tolerance_pct;
        let shoulders_match = relative_gap(left, right) <= tolerance;
        let head_stands_out = if inverted {
            head <= left.min(right) * (1.0 - tolerance)
        } else {
            head >= left.max(right) * (1.0 + tolerance)
        };
        shoulders_match && head_stands_out
    }

    fn top(&self, closes: &[f64], pivots: &Pivots) -> Option<PatternSignal> {
        let [.., left, head, right] = pivots.highs.as_slice() else {
            return None;
        };
        if !self.is_formation(left.price, head.price, right.price, false) {
            return None;
        }

        // lowest trough on each side; the neckline is the lower of the two
        let trough = |a: &Pivot, b: &Pivot| {
            pivots
                .lows_between(a.index, b.index)
                .map(|p| p.price)
                .reduce(f64::min)
        };
        let neckline = trough(left, head)?.min(trough(head, right)?);

        if !crossed_below(closes, neckline, neckline) {
            return None;
        }

        tracing::debug!(
            "Head and shoulders: head {:.4}, neckline {:.4}",
            head.price,
            neckline
        );
        PatternSignal::new(PatternKind::HeadAndShoulders, Side::Sell, head.price - neckline)
    }

    fn inverse(&self, closes: &[f64], pivots: &Pivots) -> Option<PatternSignal> {
        let [.., left, head, right] = pivots.lows.as_slice() else {
            return None;
        };
        if !self.is_formation(left.price, head.price, right.price, true) {
            return None;
        }

        let peak = |a: &Pivot, b: &Pivot| {
            pivots
                .highs_between(a.index, b.index)
                .map(|p| p.price)
                .reduce(f64::max)
        };
        let neckline = peak(left, head)?.max(peak(head, right)?);

        if !crossed_above(closes, neckline, neckline) {
            return None;
        }

        tracing::debug!(
            "Inverse head and shoulders: head {:.4}, neckline {:.4}",
            head.price,
            neckline
        );
        PatternSignal::new(PatternKind::HeadAndShoulders, Side::Buy, neckline - head.price)
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::HeadAndShoulders
    }

    fn detect(&self, candles: &[Candle]) -> Option<PatternSignal> {
        let closes = closes(candles);
        let pivots = self.config.pivots(&closes);

        self.top(&closes, &pivots)
            .or_else(|| self.inverse(&closes, &pivots))
    }
}
