//! Usage aggregation with DashMap
//!
//! Folds per-request usage records into one volume record per billing key,
//! so tiered and graduated pricing can be evaluated over a whole period.

use dashmap::DashMap;
use ratecard_common::{CalcError, Result, UsageData};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

/// Accumulates usage per billing key (customer, subscription, period, ...)
#[derive(Default)]
pub struct UsageAggregator {
    totals: DashMap<String, UsageData>,
}

impl UsageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one event to the running total for `key`
    ///
    /// Every metric is summed. `request_count` grows by the event's own
    /// `request_count` when present, otherwise by one. On overflow the
    /// running total is left untouched.
    #[instrument(skip(self, event))]
    pub fn record(&self, key: &str, event: &UsageData) -> Result<()> {
        let mut entry = self.totals.entry(key.to_string()).or_default();
        let merged = merge(entry.value(), event)?;
        *entry.value_mut() = merged;
        debug!(request_count = ?entry.request_count, "usage recorded");
        Ok(())
    }

    /// Volume usage accumulated so far for `key`
    pub fn snapshot(&self, key: &str) -> Option<UsageData> {
        self.totals.get(key).map(|entry| entry.value().clone())
    }

    /// Remove and return the volume usage for `key`, closing its period
    pub fn drain(&self, key: &str) -> Option<UsageData> {
        self.totals.remove(key).map(|(_, usage)| usage)
    }

    pub fn keys(&self) -> Vec<String> {
        self.totals.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

fn merge(total: &UsageData, event: &UsageData) -> Result<UsageData> {
    let requests = event.request_count.unwrap_or(Decimal::ONE);
    Ok(UsageData {
        input_tokens: sum(total.input_tokens, event.input_tokens)?,
        output_tokens: sum(total.output_tokens, event.output_tokens)?,
        total_tokens: sum(total.total_tokens, event.total_tokens)?,
        seconds: sum(total.seconds, event.seconds)?,
        count: sum(total.count, event.count)?,
        request_count: sum(total.request_count, Some(requests))?,
        customer_charge: sum(total.customer_charge, event.customer_charge)?,
    })
}

fn sum(lhs: Option<Decimal>, rhs: Option<Decimal>) -> Result<Option<Decimal>> {
    match (lhs, rhs) {
        (Some(a), Some(b)) => a
            .checked_add(b)
            .map(Some)
            .ok_or_else(|| CalcError::Overflow.into()),
        (a, b) => Ok(a.or(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecard_common::RatecardError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_counts_requests() {
        let aggregator = UsageAggregator::new();
        for _ in 0..3 {
            aggregator.record("acme", &UsageData::tokens(100, 50)).unwrap();
        }

        let usage = aggregator.snapshot("acme").unwrap();
        assert_eq!(usage.request_count, Some(dec!(3)));
        assert_eq!(usage.input_tokens, Some(dec!(300)));
        assert_eq!(usage.total_tokens, Some(dec!(450)));
        assert_eq!(usage.seconds, None);
    }

    #[test]
    fn test_keys_are_independent() {
        let aggregator = UsageAggregator::new();
        aggregator.record("a", &UsageData::new().with_count(1u64)).unwrap();
        aggregator.record("b", &UsageData::new().with_seconds(dec!(2.5))).unwrap();

        let mut keys = aggregator.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(aggregator.snapshot("b").unwrap().count, None);
    }

    #[test]
    fn test_drain_closes_period() {
        let aggregator = UsageAggregator::new();
        aggregator
            .record("acme", &UsageData::new().with_request_count(40u64))
            .unwrap();
        aggregator.record("acme", &UsageData::new()).unwrap();

        let usage = aggregator.drain("acme").unwrap();
        assert_eq!(usage.request_count, Some(dec!(41)));
        assert!(aggregator.is_empty());
        assert!(aggregator.drain("acme").is_none());
    }

    #[test]
    fn test_overflow_leaves_total_untouched() {
        let aggregator = UsageAggregator::new();
        let huge = UsageData::new().with_seconds(rust_decimal::Decimal::MAX);
        aggregator.record("acme", &huge).unwrap();

        let err = aggregator.record("acme", &huge).unwrap_err();
        assert_eq!(err, RatecardError::Calculation(CalcError::Overflow));
        let usage = aggregator.snapshot("acme").unwrap();
        assert_eq!(usage.seconds, Some(rust_decimal::Decimal::MAX));
        assert_eq!(usage.request_count, Some(dec!(1)));
    }
}
