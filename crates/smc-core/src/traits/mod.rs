//! Core traits for the backtester.

mod data_source;
mod detector;
mod strategy;

pub use data_source::DataSource;
pub use detector::PatternDetector;
pub use strategy::{Strategy, StrategyConfig};
