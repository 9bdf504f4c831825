//! Fair value gap detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smc_core::traits::PatternDetector;
use smc_core::types::BarSeries;

/// A three-candle price void.
///
/// Bullish when the first candle's low sits above the third candle's high
/// (zone `[c2.high, c0.low]`), bearish when the first candle's high sits
/// below the third candle's low (zone `[c0.high, c2.low]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    /// Timestamp of the first candle of the pattern
    pub start_time: DateTime<Utc>,
    /// Timestamp of the third candle; the gap is confirmed once it closes
    pub end_time: DateTime<Utc>,
    /// Top of the zone
    pub high: f64,
    /// Bottom of the zone
    pub low: f64,
    /// Bullish gaps are expected to act as support
    pub is_bullish: bool,
    /// When price first traded into the zone far enough to count
    pub filled_time: Option<DateTime<Utc>>,
    /// Deepest level reached inside the zone; not computed by the detector
    pub partially_filled_level: Option<f64>,
}

impl FairValueGap {
    /// Height of the zone.
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Whether the gap has been marked as filled.
    pub fn is_filled(&self) -> bool {
        self.filled_time.is_some()
    }
}

/// Detects fair value gaps over sliding three-candle windows.
#[derive(Debug, Clone, Default)]
pub struct FairValueGapDetector;

impl FairValueGapDetector {
    /// Create a new detector.
    pub fn new() -> Self {
        Self
    }
}

impl PatternDetector for FairValueGapDetector {
    type Output = FairValueGap;

    fn detect(&self, series: &BarSeries) -> Vec<FairValueGap> {
        let bars = series.bars();
        let mut gaps = Vec::new();

        // The middle candle only fixes the gap's place in time.
        for window in bars.windows(3) {
            let (c0, c2) = (&window[0], &window[2]);

            let zone = if c0.low > c2.high {
                Some((c0.low, c2.high, true))
            } else if c0.high < c2.low {
                Some((c2.low, c0.high, false))
            } else {
                None
            };

            if let Some((high, low, is_bullish)) = zone {
                gaps.push(FairValueGap {
                    start_time: c0.timestamp,
                    end_time: c2.timestamp,
                    high,
                    low,
                    is_bullish,
                    filled_time: None,
                    partially_filled_level: None,
                });
            }
        }

        gaps
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "Fair Value Gaps"
    }
}

/// Identify fair value gaps.
pub fn identify_fair_value_gaps(series: &BarSeries) -> Vec<FairValueGap> {
    FairValueGapDetector::new().detect(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smc_core::types::Bar;

    fn series(rows: &[(f64, f64, f64, f64)]) -> BarSeries {
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| {
                Bar::new(DateTime::from_timestamp(i as i64 * 300, 0).unwrap(), o, h, l, c)
            })
            .collect();
        BarSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn test_bullish_gap() {
        let series = series(&[
            (111.0, 112.0, 110.0, 111.0),
            (110.0, 111.0, 107.0, 107.5),
            (107.0, 108.0, 106.0, 107.5),
        ]);

        let gaps = identify_fair_value_gaps(&series);

        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert!(gap.is_bullish);
        assert_eq!(gap.high, 110.0);
        assert_eq!(gap.low, 108.0);
        assert_eq!(gap.start_time, series.bars()[0].timestamp);
        assert_eq!(gap.end_time, series.bars()[2].timestamp);
        assert!(!gap.is_filled());
        assert!((gap.range() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bearish_gap() {
        let series = series(&[
            (114.5, 115.0, 114.0, 114.8),
            (115.0, 118.0, 114.5, 117.5),
            (117.5, 119.0, 117.0, 118.5),
        ]);

        let gaps = identify_fair_value_gaps(&series);

        assert_eq!(gaps.len(), 1);
        assert!(!gaps[0].is_bullish);
        assert_eq!(gaps[0].high, 117.0);
        assert_eq!(gaps[0].low, 115.0);
    }

    #[test]
    fn test_overlapping_ranges_produce_no_gap() {
        let series = series(&[
            (100.0, 102.0, 99.0, 101.0),
            (101.0, 103.0, 100.0, 102.0),
            (102.0, 103.0, 101.5, 102.5),
        ]);

        assert!(identify_fair_value_gaps(&series).is_empty());
    }

    #[test]
    fn test_touching_boundaries_produce_no_gap() {
        // c0.low == c2.high is not a void
        let series = series(&[
            (109.0, 111.0, 108.0, 110.0),
            (108.0, 109.0, 106.0, 106.5),
            (106.5, 108.0, 105.0, 105.5),
        ]);

        assert!(identify_fair_value_gaps(&series).is_empty());
    }

    #[test]
    fn test_short_series_is_empty() {
        let series = series(&[(100.0, 101.0, 99.0, 100.5), (100.5, 102.0, 100.0, 101.5)]);
        let detector = FairValueGapDetector::new();

        assert!(detector.detect(&series).is_empty());
        assert!(detector.validate_data(&series).is_err());
    }
}
