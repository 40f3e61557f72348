//! Compiled pricing cache
//!
//! Validated pricings keyed by the blake3 fingerprint of their canonical JSON,
//! so a document seen again skips decoding checks and validation.

use dashmap::DashMap;
use ratecard_common::{Pricing, PricingContext, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A pricing that passed validation in `context`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPricing {
    pricing: Pricing,
    context: PricingContext,
    fingerprint: String,
}

impl CompiledPricing {
    pub(crate) fn new(pricing: Pricing, context: PricingContext, fingerprint: String) -> Self {
        Self {
            pricing,
            context,
            fingerprint,
        }
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn context(&self) -> PricingContext {
        self.context
    }

    /// Hex blake3 hash of the canonical JSON form
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Hash a pricing's canonical JSON form
pub fn fingerprint(pricing: &Pricing) -> Result<String> {
    let canonical = serde_json::to_vec(pricing)?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries
    pub entry_count: u64,
    pub hits: u64,
    pub misses: u64,
}

/// In-memory cache of compiled pricings using DashMap
pub struct PricingCache {
    entries: DashMap<String, Arc<CompiledPricing>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PricingCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<Arc<CompiledPricing>> {
        match self.entries.get(fingerprint) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint, "pricing cache hit");
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, compiled: Arc<CompiledPricing>) {
        if self.max_entries == 0 {
            return;
        }

        // Evict an arbitrary entry if at capacity
        if self.entries.len() >= self.max_entries
            && !self.entries.contains_key(compiled.fingerprint())
        {
            let victim = self.entries.iter().next().map(|e| e.key().clone());
            if let Some(key) = victim {
                self.entries.remove(&key);
            }
        }

        self.entries
            .insert(compiled.fingerprint().to_string(), compiled);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len() as u64,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn compiled(amount: rust_decimal::Decimal) -> Arc<CompiledPricing> {
        let pricing = Pricing::constant(amount);
        let fp = fingerprint(&pricing).unwrap();
        Arc::new(CompiledPricing::new(pricing, PricingContext::Volume, fp))
    }

    #[test]
    fn test_fingerprint_is_stable_and_scale_sensitive() {
        let a = fingerprint(&Pricing::constant(dec!(2.00))).unwrap();
        let b = fingerprint(&Pricing::constant(dec!(2.00))).unwrap();
        let c = fingerprint(&Pricing::constant(dec!(2.0))).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_get_and_insert() {
        let cache = PricingCache::new(10);
        let entry = compiled(dec!(1));

        assert!(cache.get(entry.fingerprint()).is_none());
        cache.insert(Arc::clone(&entry));
        let cached = cache.get(entry.fingerprint()).unwrap();
        assert_eq!(cached.pricing(), &Pricing::constant(dec!(1)));

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_eviction() {
        let cache = PricingCache::new(2);
        for i in 0..5 {
            cache.insert(compiled(rust_decimal::Decimal::from(i)));
        }
        assert!(cache.len() <= 2);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = PricingCache::new(0);
        cache.insert(compiled(dec!(1)));
        assert!(cache.is_empty());
    }
}
