//! Usage data for a single billing event

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::metric::Metric;

/// Metrics recorded for one cost computation
///
/// Every field is optional; an absent metric is not applicable to the event
/// and reads as zero in formulas. `total_tokens` is supplied independently
/// and is not derived from the input/output counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<Decimal>,

    /// Wall-clock seconds billed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<Decimal>,

    /// Images generated, steps run, etc.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Decimal>,

    /// Requests in the billing period (volume context only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_count: Option<Decimal>,

    /// What the customer was charged (seller payout context only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_charge: Option<Decimal>,
}

impl UsageData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token usage with the total taken as `input + output`
    pub fn tokens(input: u64, output: u64) -> Self {
        Self {
            input_tokens: Some(Decimal::from(input)),
            output_tokens: Some(Decimal::from(output)),
            total_tokens: Some(Decimal::from(input) + Decimal::from(output)),
            ..Self::default()
        }
    }

    pub fn with_input_tokens(mut self, value: impl Into<Decimal>) -> Self {
        self.input_tokens = Some(value.into());
        self
    }

    pub fn with_output_tokens(mut self, value: impl Into<Decimal>) -> Self {
        self.output_tokens = Some(value.into());
        self
    }

    pub fn with_total_tokens(mut self, value: impl Into<Decimal>) -> Self {
        self.total_tokens = Some(value.into());
        self
    }

    pub fn with_seconds(mut self, value: impl Into<Decimal>) -> Self {
        self.seconds = Some(value.into());
        self
    }

    pub fn with_count(mut self, value: impl Into<Decimal>) -> Self {
        self.count = Some(value.into());
        self
    }

    pub fn with_request_count(mut self, value: impl Into<Decimal>) -> Self {
        self.request_count = Some(value.into());
        self
    }

    pub fn with_customer_charge(mut self, value: impl Into<Decimal>) -> Self {
        self.customer_charge = Some(value.into());
        self
    }

    /// First metric carrying a negative value, in registry order
    pub fn negative_metric(&self) -> Option<Metric> {
        Metric::ALL.into_iter().find(|metric| {
            metric
                .read(self)
                .is_some_and(|v| v.is_sign_negative() && !v.is_zero())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tokens_sets_total() {
        let usage = UsageData::tokens(1_000, 250);
        assert_eq!(usage.total_tokens, Some(dec!(1250)));
        assert_eq!(usage.seconds, None);
    }

    #[test]
    fn test_deserialize_decimal_strings() {
        let usage: UsageData =
            serde_json::from_str(r#"{"seconds": "1.25", "customer_charge": "10.00"}"#).unwrap();
        assert_eq!(usage.seconds, Some(dec!(1.25)));
        assert_eq!(usage.customer_charge, Some(dec!(10.00)));
        assert_eq!(usage.input_tokens, None);
    }

    #[test]
    fn test_unknown_metric_field_rejected() {
        let result: std::result::Result<UsageData, _> =
            serde_json::from_str(r#"{"gpu_hours": "2"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_skips_absent() {
        let usage = UsageData::new().with_count(3u64);
        let json = serde_json::to_string(&usage).unwrap();
        assert_eq!(json, r#"{"count":"3"}"#);
    }

    #[test]
    fn test_negative_metric() {
        assert_eq!(UsageData::tokens(1, 2).negative_metric(), None);
        assert_eq!(UsageData::new().with_seconds(dec!(-0)).negative_metric(), None);

        let usage = UsageData::new()
            .with_customer_charge(dec!(-5))
            .with_seconds(dec!(-1));
        assert_eq!(usage.negative_metric(), Some(Metric::Seconds));
    }
}
