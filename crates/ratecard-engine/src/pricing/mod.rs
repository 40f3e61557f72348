//! Pricing module
//!
//! Provides pricing evaluation with:
//! - Exhaustive structural validation
//! - Recursive cost calculation over the pricing tree
//! - A cache of validated pricings keyed by fingerprint

pub mod cache;
pub mod calculator;
pub mod engine;
pub mod validator;

pub use cache::{fingerprint, CacheStats, CompiledPricing, PricingCache};
pub use calculator::{calculate_cost, select_tier};
pub use engine::{PricingEngine, Quote};
pub use validator::{validate, validate_in};
