//! Core types and traits for the SMC backtester.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries)
//! - Per-bar trading signals and position exposure
//! - Core traits for strategies, pattern detectors, and data sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{BacktestError, BacktestResult};
pub use types::*;
pub use traits::*;
