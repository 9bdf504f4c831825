//! CSV data source.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use smc_core::error::DataError;
use smc_core::traits::DataSource;
use smc_core::types::{Bar, BarSeries};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Header names the loader looks for. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    /// Candidates for the time column, tried in order
    pub time: Vec<String>,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    /// Optional column
    pub volume: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            time: ["timestamp", "time", "datetime", "date"]
                .into_iter()
                .map(String::from)
                .collect(),
            open: "open".into(),
            high: "high".into(),
            low: "low".into(),
            close: "close".into(),
            volume: "volume".into(),
        }
    }
}

/// Resolved column positions.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl ColumnMapping {
    fn resolve(&self, headers: &StringRecord) -> Result<ColumnIndex, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| find(name).ok_or_else(|| DataError::MissingColumn(name.to_string()));

        let time = self
            .time
            .iter()
            .find_map(|candidate| find(candidate.as_str()))
            .ok_or_else(|| DataError::MissingColumn("timestamp".into()))?;

        Ok(ColumnIndex {
            time,
            open: require(self.open.as_str())?,
            high: require(self.high.as_str())?,
            low: require(self.low.as_str())?,
            close: require(self.close.as_str())?,
            volume: find(self.volume.as_str()),
        })
    }
}

/// CSV data source for historical bars.
pub struct CsvDataSource {
    path: PathBuf,
    mapping: ColumnMapping,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
            mapping: ColumnMapping::default(),
        })
    }

    /// Use custom column names.
    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Read, coerce and validate the whole file.
    pub fn load(&self, symbol: &str) -> Result<BarSeries, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| DataError::ParseError(e.to_string()))?
            .clone();
        let columns = self.mapping.resolve(&headers)?;

        let mut coerced: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut cell = |record: &StringRecord, index: usize, name: &'static str| {
            let raw = record.get(index).unwrap_or("");
            if raw.is_empty() {
                return None;
            }
            match raw.parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    *coerced.entry(name).or_default() += 1;
                    None
                }
            }
        };

        let mut bars = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            let timestamp = parse_timestamp(record.get(columns.time).unwrap_or(""))?;

            // Missing prices become NaN so series validation names the bar.
            let open = cell(&record, columns.open, "open").unwrap_or(f64::NAN);
            let high = cell(&record, columns.high, "high").unwrap_or(f64::NAN);
            let low = cell(&record, columns.low, "low").unwrap_or(f64::NAN);
            let close = cell(&record, columns.close, "close").unwrap_or(f64::NAN);

            let mut bar = Bar::new(timestamp, open, high, low, close);
            if let Some(volume) = columns.volume.and_then(|i| cell(&record, i, "volume")) {
                bar = bar.with_volume(volume);
            }
            bars.push(bar);
        }

        for (column, count) in &coerced {
            warn!(
                path = %self.path.display(),
                column,
                count,
                "Non-numeric values treated as missing"
            );
        }

        bars.sort_by_key(|bar| bar.timestamp);
        let series = BarSeries::new(symbol, bars)?;

        info!(
            path = %self.path.display(),
            symbol,
            bars = series.len(),
            start = ?series.first().map(|bar| bar.timestamp),
            end = ?series.last().map(|bar| bar.timestamp),
            "Loaded bars"
        );

        Ok(series)
    }
}

impl DataSource for CsvDataSource {
    fn load_series(&self, symbol: &str) -> Result<BarSeries, DataError> {
        self.load(symbol)
    }
}

/// Parse the timestamp formats commonly found in exported bar data.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DataError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc());
        }
    }

    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
    }

    // Unix seconds, or milliseconds beyond 11 digits
    if let Ok(ts) = value.parse::<i64>() {
        let parsed = if ts.abs() > 10_000_000_000 {
            DateTime::from_timestamp_millis(ts)
        } else {
            DateTime::from_timestamp(ts, 0)
        };
        if let Some(dt) = parsed {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!("Could not parse timestamp: '{}'", value)))
}
