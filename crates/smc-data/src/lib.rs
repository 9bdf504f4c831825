//! Historical bar loaders.

mod csv_source;

pub use csv_source::{parse_timestamp, ColumnMapping, CsvDataSource};

use smc_core::error::DataError;
use smc_core::traits::DataSource;
use smc_core::types::BarSeries;
use std::path::Path;

/// Load a bar series from a CSV file on the blocking thread pool.
pub async fn load_csv(path: impl AsRef<Path>, symbol: &str) -> Result<BarSeries, DataError> {
    let source = CsvDataSource::new(path)?;
    let symbol = symbol.to_string();

    tokio::task::spawn_blocking(move || source.load_series(&symbol))
        .await
        .map_err(|e| DataError::Internal(e.to_string()))?
}
