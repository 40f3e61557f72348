//! Pricing engine
//!
//! Ties validation, caching and calculation together:
//! - `compile` validates a pricing once in the configured context
//! - `quote` evaluates a compiled pricing against a usage record
//! - `quote_json` does both for a raw JSON document

use ratecard_common::{CalcError, Pricing, RatecardError, Result, UsageData, ValidationErrors};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::cache::{fingerprint, CacheStats, CompiledPricing, PricingCache};
use super::calculator::calculate_cost;
use super::validator::validate_in;
use crate::config::EngineConfig;
use crate::decode;

/// Cost of one billing event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Exact computed cost
    pub cost: Decimal,
    /// Cost after the configured rounding
    pub amount: Decimal,
    /// Fingerprint of the pricing that produced it
    pub fingerprint: String,
}

/// Validating, caching front end to the cost calculator
pub struct PricingEngine {
    config: EngineConfig,
    cache: PricingCache,
}

impl PricingEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = PricingCache::new(config.cache_capacity);
        Self { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a pricing in the configured context
    #[instrument(skip(self, pricing), fields(pricing_type = pricing.type_name()))]
    pub fn validate(&self, pricing: &Pricing) -> Result<()> {
        validate_in(pricing, self.config.context).map_err(|errors| {
            warn!(violations = errors.len(), "pricing rejected");
            RatecardError::Validation(ValidationErrors(errors))
        })
    }

    /// Validate a pricing and keep it for repeated evaluation
    #[instrument(skip(self, pricing), fields(pricing_type = pricing.type_name()))]
    pub fn compile(&self, pricing: &Pricing) -> Result<Arc<CompiledPricing>> {
        let fingerprint = fingerprint(pricing)?;
        if let Some(compiled) = self.cache.get(&fingerprint) {
            return Ok(compiled);
        }

        self.validate(pricing)?;
        let compiled = Arc::new(CompiledPricing::new(
            pricing.clone(),
            self.config.context,
            fingerprint,
        ));
        self.cache.insert(Arc::clone(&compiled));
        debug!(nodes = pricing.node_count(), "pricing compiled");
        Ok(compiled)
    }

    /// Price one usage record
    ///
    /// Usage with a negative metric is rejected before any calculation.
    #[instrument(skip(self, compiled, usage), fields(fingerprint = compiled.fingerprint()))]
    pub fn quote(&self, compiled: &CompiledPricing, usage: &UsageData) -> Result<Quote> {
        if let Some(metric) = usage.negative_metric() {
            warn!(%metric, "negative usage rejected");
            return Err(CalcError::NegativeUsage {
                metric: metric.name(),
            }
            .into());
        }
        let cost = calculate_cost(compiled.pricing(), usage)?;
        Ok(Quote {
            cost,
            amount: self.round(cost),
            fingerprint: compiled.fingerprint().to_string(),
        })
    }

    /// Decode, compile and price a JSON pricing document
    pub fn quote_json(&self, document: &str, usage: &UsageData) -> Result<Quote> {
        let pricing = decode::from_json(document).map_err(|errors| {
            warn!(violations = errors.len(), "pricing document rejected");
            RatecardError::Validation(ValidationErrors(errors))
        })?;
        let compiled = self.compile(&pricing)?;
        self.quote(&compiled, usage)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn round(&self, cost: Decimal) -> Decimal {
        match self.config.scale {
            Some(scale) => cost.round_dp_with_strategy(scale, self.config.rounding.strategy()),
            None => cost,
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoundingMode;
    use ratecard_common::{GradTier, PricingContext, ValidationErrorKind};
    use rust_decimal_macros::dec;

    #[test]
    fn test_compile_and_quote() {
        let engine = PricingEngine::default();
        let pricing = Pricing::graduated(
            "request_count",
            vec![GradTier::new(1000, dec!(0.01)), GradTier::unbounded(dec!(0.008))],
        );
        let compiled = engine.compile(&pricing).unwrap();
        let quote = engine
            .quote(&compiled, &UsageData::new().with_request_count(5000u64))
            .unwrap();
        assert_eq!(quote.cost, dec!(42.00));
        assert_eq!(quote.amount, quote.cost);
        assert_eq!(quote.fingerprint, compiled.fingerprint());
    }

    #[test]
    fn test_compile_uses_cache() {
        let engine = PricingEngine::default();
        let pricing = Pricing::per_image(dec!(0.04));
        let first = engine.compile(&pricing).unwrap();
        let second = engine.compile(&pricing).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache_stats().hits, 1);
    }

    #[test]
    fn test_compile_rejects_out_of_context() {
        let engine = PricingEngine::default();
        let err = engine
            .compile(&Pricing::revenue_share(dec!(70)))
            .unwrap_err();
        let RatecardError::Validation(errors) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert!(matches!(
            errors.0[0].kind,
            ValidationErrorKind::VariantOutOfContext { .. }
        ));
        assert_eq!(engine.cache_stats().entry_count, 0);
    }

    #[test]
    fn test_payout_engine() {
        let engine =
            PricingEngine::new(EngineConfig::default().with_context(PricingContext::Payout));
        let compiled = engine.compile(&Pricing::revenue_share(dec!(70.00))).unwrap();
        let quote = engine
            .quote(&compiled, &UsageData::new().with_customer_charge(dec!(10.00)))
            .unwrap();
        assert_eq!(quote.cost, dec!(7.00));
        assert_eq!(compiled.context(), PricingContext::Payout);
    }

    #[test]
    fn test_rounding() {
        let engine =
            PricingEngine::new(EngineConfig::default().with_scale(2, RoundingMode::HalfEven));
        let compiled = engine.compile(&Pricing::per_second(dec!(0.001))).unwrap();

        let quote = engine
            .quote(&compiled, &UsageData::new().with_seconds(dec!(12.5)))
            .unwrap();
        assert_eq!(quote.cost, dec!(0.0125));
        assert_eq!(quote.amount, dec!(0.01));

        let engine = PricingEngine::new(EngineConfig::default().with_scale(2, RoundingMode::Up));
        let quote = engine
            .quote(&compiled, &UsageData::new().with_seconds(dec!(12.5)))
            .unwrap();
        assert_eq!(quote.amount, dec!(0.02));
    }

    #[test]
    fn test_quote_rejects_negative_usage() {
        let engine = PricingEngine::default();
        let compiled = engine.compile(&Pricing::per_image(dec!(0.04))).unwrap();
        let err = engine
            .quote(&compiled, &UsageData::new().with_count(dec!(-3)))
            .unwrap_err();
        assert_eq!(
            err,
            RatecardError::Calculation(CalcError::NegativeUsage { metric: "count" })
        );
    }

    #[test]
    fn test_quote_json() {
        let engine = PricingEngine::default();
        let quote = engine
            .quote_json(
                r#"{"type": "one_million_tokens", "input": "0.50", "output": "1.50"}"#,
                &UsageData::new()
                    .with_input_tokens(1_000_000u64)
                    .with_output_tokens(2_000_000u64),
            )
            .unwrap();
        assert_eq!(quote.amount, dec!(3.50));
        assert!(serde_json::to_value(&quote).unwrap()["amount"].is_string());
    }

    #[test]
    fn test_quote_json_reports_decode_errors() {
        let engine = PricingEngine::default();
        let err = engine
            .quote_json(r#"{"type": "bogus"}"#, &UsageData::new())
            .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }
}
