//! Pattern detector trait definitions.

use crate::error::DataError;
use crate::types::BarSeries;

/// Trait for market-structure pattern detectors.
///
/// Detectors scan a bar series once and return the events they find in
/// chronological order.
pub trait PatternDetector: Send + Sync {
    /// The event type produced by the detector.
    type Output;

    /// Scan the series and return every detected event.
    ///
    /// Series shorter than [`PatternDetector::min_bars`] produce no events.
    fn detect(&self, series: &BarSeries) -> Vec<Self::Output>;

    /// Get the minimum number of bars a pattern spans.
    fn min_bars(&self) -> usize;

    /// Get the name of the detector.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, series: &BarSeries) -> Result<(), DataError> {
        if series.len() < self.min_bars() {
            return Err(DataError::InsufficientData {
                required: self.min_bars(),
                available: series.len(),
            });
        }
        Ok(())
    }
}
