//! Data source trait definitions.

use crate::error::DataError;
use crate::types::BarSeries;

/// Trait for historical bar sources.
///
/// Implementations own all format concerns (column names, timestamp
/// parsing, numeric coercion) and hand back a validated series.
pub trait DataSource: Send + Sync {
    /// Load the full history for `symbol`, oldest bar first.
    fn load_series(&self, symbol: &str) -> Result<BarSeries, DataError>;
}
