//! # Ratecard Common
//!
//! Shared types and the expression language for the Ratecard pricing engine.
//!
//! ## Core Types
//!
//! - [`UsageData`]: metrics recorded for one billing event
//! - [`Metric`]/[`PricingContext`]: the metric registry and where each metric is legal
//! - [`Pricing`]: tagged-union cost specification, possibly composite
//! - [`Expression`]/[`Formula`]: arithmetic over metric names
//!
//! All money is [`rust_decimal::Decimal`]; nothing is computed in binary floating point.

pub mod error;
pub mod expression;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    CalcError, ExpressionError, RatecardError, Result, ValidationError, ValidationErrorKind,
    ValidationErrors,
};
pub use expression::{evaluate, parse, BinaryOp, Expression, Formula, Node};
pub use types::{
    metric::{Metric, PricingContext},
    pricing::{GradTier, Pricing, Tier, TierBound, PRICING_TYPES},
    usage::UsageData,
};

/// Ratecard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Token prices are quoted per this many tokens
pub const TOKENS_PER_PRICE_UNIT: u64 = 1_000_000;

/// Upper bound of a revenue share percentage
pub const MAX_REVENUE_SHARE_PERCENT: u64 = 100;
