//! Order block detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smc_core::traits::PatternDetector;
use smc_core::types::BarSeries;

/// A single candle whose range is expected to act as support (bullish)
/// or resistance (bearish) because the next candle moved strongly away from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    /// Timestamp of the candle forming the block
    pub start_time: DateTime<Utc>,
    /// Same as `start_time`; blocks span one candle
    pub end_time: DateTime<Utc>,
    /// High of the block candle
    pub high: f64,
    /// Low of the block candle
    pub low: f64,
    /// Volume of the block candle, if known
    pub volume: Option<f64>,
    /// Bullish blocks are bearish candles expected to hold as support
    pub is_bullish: bool,
    /// When price revisited the block; not computed by the detector
    pub mitigated_time: Option<DateTime<Utc>>,
    /// Whether the mitigation was by wick only
    pub mitigated_by_wick: bool,
}

impl OrderBlock {
    /// Whether price has revisited the block.
    pub fn is_mitigated(&self) -> bool {
        self.mitigated_time.is_some()
    }
}

/// Detects order blocks from adjacent candle pairs.
#[derive(Debug, Clone)]
pub struct OrderBlockDetector {
    strength_factor: f64,
}

impl OrderBlockDetector {
    /// Default ratio the move candle's body must exceed the block body by.
    pub const DEFAULT_STRENGTH_FACTOR: f64 = 1.2;

    /// Create a detector with the given strength factor.
    pub fn new(strength_factor: f64) -> Self {
        Self { strength_factor }
    }

    /// Get the strength factor.
    pub fn strength_factor(&self) -> f64 {
        self.strength_factor
    }
}

impl Default for OrderBlockDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STRENGTH_FACTOR)
    }
}

impl PatternDetector for OrderBlockDetector {
    type Output = OrderBlock;

    fn detect(&self, series: &BarSeries) -> Vec<OrderBlock> {
        let bars = series.bars();
        let mut blocks = Vec::new();

        for pair in bars.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let strong_move = curr.body() > prev.body() * self.strength_factor;

            let block = |is_bullish| OrderBlock {
                start_time: prev.timestamp,
                end_time: prev.timestamp,
                high: prev.high,
                low: prev.low,
                volume: prev.volume,
                is_bullish,
                mitigated_time: None,
                mitigated_by_wick: false,
            };

            // Bearish candle followed by a strong bullish close above its high
            if prev.is_bearish() && curr.is_bullish() && curr.close > prev.high && strong_move {
                blocks.push(block(true));
            }

            // Bullish candle followed by a strong bearish break below its low
            if prev.is_bullish() && curr.is_bearish() && curr.low < prev.low && strong_move {
                blocks.push(block(false));
            }
        }

        blocks
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "Order Blocks"
    }
}

/// Identify order blocks with the given strength factor.
pub fn identify_order_blocks(series: &BarSeries, strength_factor: f64) -> Vec<OrderBlock> {
    OrderBlockDetector::new(strength_factor).detect(series)
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
    fn test_bullish_block() {
        let series = series(&[(100.0, 101.0, 99.0, 98.0), (98.0, 103.0, 97.0, 102.0)]);

        let blocks = identify_order_blocks(&series, 1.2);

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert!(block.is_bullish);
        assert_eq!(block.high, 101.0);
        assert_eq!(block.low, 99.0);
        assert_eq!(block.start_time, series.bars()[0].timestamp);
        assert_eq!(block.end_time, block.start_time);
        assert_eq!(block.volume, None);
        assert!(!block.is_mitigated());
    }

    #[test]
    fn test_bearish_block() {
        let series = series(&[(105.0, 107.5, 104.0, 107.0), (107.0, 108.0, 103.0, 104.0)]);

        let blocks = identify_order_blocks(&series, 1.2);

        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].is_bullish);
        assert_eq!(blocks[0].high, 107.5);
        assert_eq!(blocks[0].low, 104.0);
    }

    #[test]
    fn test_weak_move_is_ignored() {
        // Body 2.3 does not exceed 2 * 1.2
        let series = series(&[(100.0, 101.0, 97.0, 98.0), (98.9, 101.5, 98.5, 101.2)]);

        assert!(identify_order_blocks(&series, 1.2).is_empty());
        assert_eq!(identify_order_blocks(&series, 1.0).len(), 1);
    }

    #[test]
    fn test_close_must_clear_previous_high() {
        let series = series(&[(100.0, 104.0, 99.0, 99.5), (99.0, 103.5, 98.5, 103.0)]);

        assert!(identify_order_blocks(&series, 1.2).is_empty());
    }

    #[test]
    fn test_volume_is_carried_and_short_series_is_empty() {
        let bars = vec![
            Bar::new(DateTime::from_timestamp(0, 0).unwrap(), 100.0, 101.0, 99.0, 98.0)
                .with_volume(150.0),
            Bar::new(DateTime::from_timestamp(60, 0).unwrap(), 98.0, 103.0, 97.0, 102.0),
        ];
        let full = BarSeries::new("TEST", bars.clone()).unwrap();
        assert_eq!(identify_order_blocks(&full, 1.2)[0].volume, Some(150.0));

        let single = BarSeries::new("TEST", bars[..1].to_vec()).unwrap();
        let detector = OrderBlockDetector::default();
        assert!(detector.detect(&single).is_empty());
        assert!(detector.validate_data(&single).is_err());
    }

    #[test]
    fn test_blocks_are_chronological() {
        let series = series(&[
            (100.0, 101.0, 99.0, 98.0),
            (98.0, 103.0, 97.0, 102.0),
            (105.0, 107.5, 104.0, 107.0),
            (107.0, 108.0, 103.0, 104.0),
        ]);

        let blocks = identify_order_blocks(&series, 1.2);

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_bullish);
        assert!(!blocks[1].is_bullish);
        assert!(blocks[0].start_time < blocks[1].start_time);
    }
}
