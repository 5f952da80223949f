use super::pivots::{crossed_above, crossed_below, relative_gap, Pivots};
use super::{closes, PatternConfig, PatternDetector};
use crate::models::{Candle, PatternKind, PatternSignal, Side};

/// Double bottom / double top
///
/// Two comparable swing lows with a swing high between them form a double
/// bottom; closing above that neckline is a buy with target = neckline minus
/// the bottoms' mean. The double top mirrors it. Bottoms are checked first.
#[derive(Debug, Clone, Default)]
pub struct DoubleBottomTopDetector {
    config: PatternConfig,
}

impl DoubleBottomTopDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    fn double_bottom(&self, closes: &[f64], pivots: &Pivots) -> Option<PatternSignal> {
        let [.., first, second] = pivots.lows.as_slice() else {
            return None;
        };
        if relative_gap(first.price, second.price) > self.config.tolerance_pct {
            return None;
        }

        let neckline = pivots
            .highs_between(first.index, second.index)
            .map(|p| p.price)
            .fold(f64::NEG_INFINITY, f64::max);
        let floor = first.price.max(second.price);
        if neckline < floor * (1.0 + self.config.tolerance_pct) {
            return None;
        }

        if !crossed_above(closes, neckline, neckline) {
            return None;
        }

        let target = neckline - (first.price + second.price) / 2.0;
        tracing::debug!(
            "Double bottom at {:.4}/{:.4}, neckline {:.4}",
            first.price,
            second.price,
            neckline
        );
        PatternSignal::new(PatternKind::DoubleBottomTop, Side::Buy, target)
    }

    fn double_top(&self, closes: &[f64], pivots: &Pivots) -> Option<PatternSignal> {
        let [.., first, second] = pivots.highs.as_slice() else {
            return None;
        };
        if relative_gap(first.price, second.price) > self.config.tolerance_pct {
            return None;
        }

        let trough = pivots
            .lows_between(first.index, second.index)
            .map(|p| p.price)
            .fold(f64::INFINITY, f64::min);
        let ceiling = first.price.min(second.price);
        if trough > ceiling * (1.0 - self.config.tolerance_pct) {
            return None;
        }

        if !crossed_below(closes, trough, trough) {
            return None;
        }

        let target = (first.price + second.price) / 2.0 - trough;
        tracing::debug!(
            "Double top at {:.4}/{:.4}, trough {:.4}",
            first.price,
            second.price,
            trough
        );
        PatternSignal::new(PatternKind::DoubleBottomTop, Side::Sell, target)
    }
}

impl PatternDetector for DoubleBottomTopDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleBottomTop
    }

    fn detect(&self, candles: &[Candle]) -> Option<PatternSignal> {
        let closes = closes(candles);
        let pivots = self.config.pivots(&closes);

        self.double_bottom(&closes, &pivots)
            .or_else(|| self.double_top(&closes, &pivots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candles_from_closes, zigzag};

    #[test]
    fn test_double_bottom_breakout_buys() {
        let closes = zigzag(&[
            (0, 120.0),
            (15, 100.0),
            (30, 112.0),
            (45, 100.5),
            (59, 111.5),
            (60, 113.0),
        ]);
        let signal = DoubleBottomTopDetector::default()
            .detect(&candles_from_closes(&closes))
            .unwrap();

        assert_eq!(signal.pattern, PatternKind::DoubleBottomTop);
        assert_eq!(signal.side, Side::Buy);
        assert!((signal.target_distance - 11.75).abs() < 1e-9);
    }

    #[test]
    fn test_double_top_breakdown_sells() {
        let closes = zigzag(&[
            (0, 80.0),
            (15, 100.0),
            (30, 90.0),
            (45, 99.5),
            (59, 90.5),
            (60, 89.0),
        ]);
        let signal = DoubleBottomTopDetector::default()
            .detect(&candles_from_closes(&closes))
            .unwrap();

        assert_eq!(signal.side, Side::Sell);
        assert!((signal.target_distance - 9.75).abs() < 1e-9);
    }

    #[test]
    fn test_unequal_bottoms_are_ignored() {
        let closes = zigzag(&[
            (0, 120.0),
            (15, 100.0),
            (30, 112.0),
            (45, 105.0),
            (59, 111.5),
            (60, 113.0),
        ]);
        assert!(DoubleBottomTopDetector::default()
            .detect(&candles_from_closes(&closes))
            .is_none());
    }

    #[test]
    fn test_stale_breakout_is_ignored() {
        // neckline was crossed two candles ago
        let closes = zigzag(&[
            (0, 120.0),
            (15, 100.0),
            (30, 112.0),
            (45, 100.5),
            (58, 113.0),
            (60, 114.0),
        ]);
        assert!(DoubleBottomTopDetector::default()
            .detect(&candles_from_closes(&closes))
            .is_none());
    }
}
