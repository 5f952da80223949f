//! Swing points and trend lines shared by the chart-pattern detectors
//!
//! Swing detection works on closes: a swing high is a close strictly above
//! the `span` closes on each side of it, a swing low strictly below. Wicks are
//! ignored, so pivots, trend lines and the breakout close share one series.
//! The last `span` candles can never be swing points because their right-hand
//! neighbours do not exist yet.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub index: usize,
    pub price: f64,
}

/// Swing highs and lows found in the trailing window, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pivots {
    pub highs: Vec<Pivot>,
    pub lows: Vec<Pivot>,
}

impl Pivots {
    /// Locate swing points among the last `lookback` closes
    ///
    /// Indices refer to the full `closes` slice.
    pub fn find(closes: &[f64], lookback: usize, span: usize) -> Self {
        let mut pivots = Pivots::default();
        if span == 0 || closes.len() < 2 * span + 1 {
            return pivots;
        }

        let start = closes.len().saturating_sub(lookback).max(span);
        let end = closes.len() - span;

        for i in start..end {
            let current = closes[i];
            let neighbours = closes[i - span..i]
                .iter()
                .chain(closes[i + 1..=i + span].iter());

            let (mut is_high, mut is_low) = (true, true);
            for &other in neighbours {
                is_high &= current > other;
                is_low &= current < other;
            }

            if is_high {
                pivots.highs.push(Pivot { index: i, price: current });
            }
            if is_low {
                pivots.lows.push(Pivot { index: i, price: current });
            }
        }

        pivots
    }

    /// Highs strictly between two indices
    pub fn highs_between(&self, from: usize, to: usize) -> impl Iterator<Item = &Pivot> {
        self.highs.iter().filter(move |p| p.index > from && p.index < to)
    }

    /// Lows strictly between two indices
    pub fn lows_between(&self, from: usize, to: usize) -> impl Iterator<Item = &Pivot> {
        self.lows.iter().filter(move |p| p.index > from && p.index < to)
    }
}

/// Up to `max` most recent pivots, or None when fewer than `min` exist
pub fn recent(pivots: &[Pivot], min: usize, max: usize) -> Option<&[Pivot]> {
    if pivots.len() < min.max(2) {
        return None;
    }
    Some(&pivots[pivots.len().saturating_sub(max)..])
}

/// Relative distance between two prices, measured against the smaller one
pub fn relative_gap(a: f64, b: f64) -> f64 {
    (a - b).abs() / a.min(b)
}

/// Straight line `price = slope * index + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    /// Least-squares fit through the pivots (at least two distinct indices)
    pub fn fit(points: &[Pivot]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.index as f64).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.price).sum::<f64>() / n;

        let mut covariance = 0.0;
        let mut variance = 0.0;
        for p in points {
            let dx = p.index as f64 - mean_x;
            covariance += dx * (p.price - mean_y);
            variance += dx * dx;
        }

        if variance == 0.0 {
            return None;
        }

        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn value_at(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }
}

/// Pair of trend lines through recent swing highs (upper) and lows (lower)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub upper: TrendLine,
    pub lower: TrendLine,
    /// Index of the oldest pivot used by either line
    pub start: usize,
}

impl Channel {
    /// Fit both lines through the last `max` (at least `min`) highs and lows
    pub fn fit(pivots: &Pivots, min: usize, max: usize) -> Option<Self> {
        let highs = recent(&pivots.highs, min, max)?;
        let lows = recent(&pivots.lows, min, max)?;

        Some(Self {
            upper: TrendLine::fit(highs)?,
            lower: TrendLine::fit(lows)?,
            start: highs[0].index.min(lows[0].index),
        })
    }

    pub fn width_at(&self, index: usize) -> f64 {
        self.upper.value_at(index) - self.lower.value_at(index)
    }

    /// Lines are apart at the start, still apart at `now`, and narrowing
    pub fn is_converging(&self, now: usize) -> bool {
        let initial = self.width_at(self.start);
        let current = self.width_at(now);
        initial > 0.0 && current > 0.0 && current < initial
    }
}

/// Last close crossed above `level_now` while the previous close was at or below `level_prev`
pub fn crossed_above(closes: &[f64], level_prev: f64, level_now: f64) -> bool {
    match closes {
        [.., prev, last] => *prev <= level_prev && *last > level_now,
        _ => false,
    }
}

/// Last close crossed below `level_now` while the previous close was at or above `level_prev`
pub fn crossed_below(closes: &[f64], level_prev: f64, level_now: f64) -> bool {
    match closes {
        [.., prev, last] => *prev >= level_prev && *last < level_now,
        _ => false,
    }
}
