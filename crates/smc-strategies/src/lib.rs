//! Smart-money-concept trading strategies.
//!
//! This crate provides:
//! - Order Block Entry
//! - Fair Value Gap Entry
//!
//! Strategies are stateless between calls: every `generate_signals` run
//! starts flat with freshly detected zones.

mod fair_value_gap_entry;
mod order_block_entry;
mod registry;

pub use fair_value_gap_entry::{FairValueGapEntry, FairValueGapEntryConfig};
pub use order_block_entry::{OrderBlockEntry, OrderBlockEntryConfig};
pub use registry::{StrategyInfo, StrategyRegistry};
