// Chart pattern detectors
//
// Each detector is a pure function of the candle series: it either returns a
// signal with a projected target distance or nothing. The resolver consults
// them in the order returned by `default_detectors`.

pub mod double_extremum;
pub mod head_and_shoulders;
pub mod pivots;
pub mod triangle;
pub mod wedge;

pub use double_extremum::DoubleBottomTopDetector;
pub use head_and_shoulders::HeadAndShouldersDetector;
pub use pivots::{Channel, Pivot, Pivots, TrendLine};
pub use triangle::SymmetricalTriangleDetector;
pub use wedge::WedgeDetector;

use crate::models::{Candle, PatternKind, PatternSignal};
use serde::{Deserialize, Serialize};

/// Base trait for all chart pattern detectors
pub trait PatternDetector: Send + Sync {
    /// Which pattern family this detector recognises
    fn kind(&self) -> PatternKind;

    /// Classify the series; `None` means the pattern is not present
    fn detect(&self, candles: &[Candle]) -> Option<PatternSignal>;
}

/// Geometry tolerances shared by the detectors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    /// Candles searched for swing points
    pub lookback: usize,
    /// Neighbours on each side a swing point must dominate
    pub pivot_span: usize,
    /// Relative tolerance for "equal" highs/lows (0.015 = 1.5%)
    pub tolerance_pct: f64,
    /// Minimum swing points per trend line
    pub min_pivots: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            lookback: 120,
            pivot_span: 3,
            tolerance_pct: 0.015,
            min_pivots: 2,
        }
    }
}

impl PatternConfig {
    /// Swing points of the configured window
    pub fn pivots(&self, closes: &[f64]) -> Pivots {
        Pivots::find(closes, self.lookback, self.pivot_span)
    }
}

/// The four detectors in resolution order:
/// wedge, double bottom/top, head and shoulders, symmetrical triangle
pub fn default_detectors(config: &PatternConfig) -> Vec<Box<dyn PatternDetector>> {
    vec![
        Box::new(WedgeDetector::new(config.clone())),
        Box::new(DoubleBottomTopDetector::new(config.clone())),
        Box::new(HeadAndShouldersDetector::new(config.clone())),
        Box::new(SymmetricalTriangleDetector::new(config.clone())),
    ]
}

pub(crate) fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
