//! Metering module
//!
//! Builds volume-context usage out of per-request events.

pub mod aggregator;

pub use aggregator::UsageAggregator;
