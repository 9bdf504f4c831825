//! Strategy trait definitions.

use crate::error::StrategyError;
use crate::types::{BarSeries, Signal};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// Core strategy trait.
///
/// A strategy maps a whole bar series to one signal per bar. Any state it
/// needs (open exposure, active zones) lives inside a single call, so one
/// instance can be shared across independent runs.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Produce one signal per bar.
    ///
    /// The returned vector must have exactly `series.len()` entries. Series
    /// shorter than [`Strategy::min_bars`] yield all-hold signals.
    fn generate_signals(&self, series: &BarSeries) -> Vec<Signal>;

    /// Minimum number of bars needed before any signal can be produced.
    fn min_bars(&self) -> usize;

    /// Effective parameters, for reporting.
    fn parameters(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }

    /// Check if the series is long enough to trade.
    fn has_enough_bars(&self, bars_available: usize) -> bool {
        bars_available >= self.min_bars()
    }
}
