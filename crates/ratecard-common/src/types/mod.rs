//! Core types for Ratecard

pub mod metric;
pub mod pricing;
pub mod usage;
