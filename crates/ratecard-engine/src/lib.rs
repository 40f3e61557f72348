//! # Ratecard Engine
//!
//! Pricing validation, cost calculation and usage aggregation.
//!
//! ## Entry points
//!
//! ```text
//! validate(pricing)              -> Result<(), Vec<ValidationError>>
//! calculate_cost(pricing, usage) -> Result<Decimal, CalcError>
//! ```
//!
//! [`PricingEngine`] layers configuration, a compiled-pricing cache and
//! rounding on top of those two functions. Every operation is a pure function
//! of immutable inputs, so pricings can be shared across threads freely.

pub mod config;
pub mod decode;
pub mod metering;
pub mod pricing;

pub use config::{EngineConfig, RoundingMode};
pub use metering::UsageAggregator;
pub use pricing::{
    calculate_cost, fingerprint, select_tier, validate, validate_in, CacheStats, CompiledPricing,
    PricingCache, PricingEngine, Quote,
};

pub use ratecard_common::{
    CalcError, ExpressionError, GradTier, Metric, Pricing, PricingContext, RatecardError, Result,
    Tier, UsageData, ValidationError, ValidationErrorKind, ValidationErrors,
};
