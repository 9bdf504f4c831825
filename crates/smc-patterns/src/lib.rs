//! Market-structure pattern detectors.
//!
//! This crate turns raw price bars into higher-level events consumed by
//! strategies:
//! - Order blocks (single-candle support/resistance zones)
//! - Fair value gaps (three-candle price voids)
//!
//! Detectors are pure functions of a validated [`smc_core::BarSeries`] and
//! return events in chronological order.

pub mod fair_value_gap;
pub mod order_block;

pub use fair_value_gap::{identify_fair_value_gaps, FairValueGap, FairValueGapDetector};
pub use order_block::{identify_order_blocks, OrderBlock, OrderBlockDetector};
