//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::DataError;

/// A single price bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume, when the source provides one
    pub volume: Option<f64>,
}

impl Bar {
    /// Create a new bar without volume.
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Attach a volume to the bar.
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Calculate the bar's body size (absolute difference between open and close).
    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Check if the bar is bullish (close > open).
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check if the bar is bearish (close < open).
    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Whether the bar's `[low, high]` range intersects `[zone_low, zone_high]`.
    #[inline]
    pub fn overlaps(&self, zone_low: f64, zone_high: f64) -> bool {
        self.low <= zone_high && self.high >= zone_low
    }

    /// Whether open and close lie inside `[low, high]`.
    pub fn within_envelope(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }

    /// Structural checks that every bar must pass.
    fn check(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(format!("{} is missing or not a finite number", name));
            }
        }
        if self.high < self.low {
            return Err(format!("high {} is below low {}", self.high, self.low));
        }
        if let Some(volume) = self.volume {
            if !volume.is_finite() || volume < 0.0 {
                return Err(format!("invalid volume {}", volume));
            }
        }
        Ok(())
    }
}

/// Immutable, time-ordered series of bars for one instrument.
///
/// Construction guarantees ascending, unique timestamps and finite OHLC
/// values, so every consumer can index bars without re-checking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap a list of bars.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.check()
                .map_err(|reason| DataError::InvalidBar { index, reason })?;

            if index > 0 {
                match bar.timestamp.cmp(&bars[index - 1].timestamp) {
                    Ordering::Greater => {}
                    Ordering::Equal => return Err(DataError::DuplicateTimestamp { index }),
                    Ordering::Less => return Err(DataError::OutOfOrder { index }),
                }
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Get the first bar.
    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Extract open prices as a vector.
    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    /// Number of bars whose open or close falls outside `[low, high]`.
    pub fn envelope_violations(&self) -> usize {
        self.bars.iter().filter(|b| !b.within_envelope()).count()
    }
}
