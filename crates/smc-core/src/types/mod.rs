//! Core data types for the backtester.

mod ohlcv;
mod signal;

pub use ohlcv::{Bar, BarSeries};
pub use signal::{Exposure, Signal};
