//! Engine configuration

use ratecard_common::{PricingContext, RatecardError, Result};
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rounding applied to a quote when a scale is configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Banker's rounding
    #[default]
    HalfEven,
    HalfUp,
    /// Truncate toward zero
    Down,
    /// Away from zero
    Up,
}

impl RoundingMode {
    pub fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::Down => RoundingStrategy::ToZero,
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
        }
    }
}

impl FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "half_even" | "bankers" => Ok(RoundingMode::HalfEven),
            "half_up" => Ok(RoundingMode::HalfUp),
            "down" => Ok(RoundingMode::Down),
            "up" => Ok(RoundingMode::Up),
            other => Err(format!("unknown rounding mode: {}", other)),
        }
    }
}

/// Pricing engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Context pricings are validated in
    pub context: PricingContext,
    /// Decimal places quotes are rounded to; `None` keeps the exact cost
    pub scale: Option<u32>,
    pub rounding: RoundingMode,
    /// Compiled pricings kept in the cache
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context: PricingContext::default(),
            scale: None,
            rounding: RoundingMode::default(),
            cache_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment, reading `.env` first
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from `RATECARD_*` variables resolved by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(val) = lookup("RATECARD_CONTEXT") {
            cfg.context = val.parse().map_err(RatecardError::Config)?;
        }
        if let Some(val) = lookup("RATECARD_SCALE") {
            let scale = val
                .trim()
                .parse::<u32>()
                .map_err(|e| RatecardError::Config(format!("RATECARD_SCALE: {}", e)))?;
            cfg.scale = Some(scale);
        }
        if let Some(val) = lookup("RATECARD_ROUNDING") {
            cfg.rounding = val.parse().map_err(RatecardError::Config)?;
        }
        if let Some(val) = lookup("RATECARD_CACHE_CAPACITY") {
            cfg.cache_capacity = val
                .trim()
                .parse()
                .map_err(|e| RatecardError::Config(format!("RATECARD_CACHE_CAPACITY: {}", e)))?;
        }

        Ok(cfg)
    }

    pub fn with_context(mut self, context: PricingContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_scale(mut self, scale: u32, rounding: RoundingMode) -> Self {
        self.scale = Some(scale);
        self.rounding = rounding;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let cfg = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.context, PricingContext::Volume);
        assert_eq!(cfg.scale, None);
    }

    #[test]
    fn test_reads_variables() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            ("RATECARD_CONTEXT", "payout"),
            ("RATECARD_SCALE", "2"),
            ("RATECARD_ROUNDING", "half_up"),
            ("RATECARD_CACHE_CAPACITY", "16"),
        ]))
        .unwrap();
        assert_eq!(cfg.context, PricingContext::Payout);
        assert_eq!(cfg.scale, Some(2));
        assert_eq!(cfg.rounding, RoundingMode::HalfUp);
        assert_eq!(cfg.cache_capacity, 16);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EngineConfig::from_lookup(lookup(&[("RATECARD_SCALE", "two")])).unwrap_err();
        assert!(matches!(err, RatecardError::Config(_)));

        let err =
            EngineConfig::from_lookup(lookup(&[("RATECARD_CONTEXT", "retail")])).unwrap_err();
        assert!(err.to_string().contains("retail"));
    }

    #[test]
    fn test_deserialize_partial() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"scale": 4}"#).unwrap();
        assert_eq!(cfg.scale, Some(4));
        assert_eq!(cfg.rounding, RoundingMode::HalfEven);
    }

    #[test]
    fn test_default_variants() {
        assert_eq!(RoundingMode::default(), RoundingMode::HalfEven);
        assert_eq!(PricingContext::default(), PricingContext::Volume);
    }
}
