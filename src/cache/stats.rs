//! Cache Statistics Module
//!
//! Introspection snapshot of the cache: current size, keys, hits and misses.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of the cache, for debugging only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of entries currently held (expired-but-unswept included)
    pub size: usize,
    /// Keys currently held, sorted
    pub keys: Vec<String>,
    /// Number of lookups that returned a fresh value
    pub hits: u64,
    /// Number of lookups that found nothing or an expired entry
    pub misses: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Running hit/miss counters kept by the store.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }
}
