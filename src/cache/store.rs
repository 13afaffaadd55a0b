//! Cache Store Module
//!
//! In-memory key-value map with lazy TTL expiry and pattern invalidation.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, KeyPattern};

// == Cache Store ==
/// Expiring key-value storage. None of its operations fail; a miss is `None`.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Hit/miss counters
    counters: Counters,
}

impl CacheStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a value under `key` for `ttl`, overwriting any existing entry.
    ///
    /// A zero TTL would be expired before anyone could read it, so it only
    /// drops the existing entry.
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl: Duration) {
        let key = key.into();
        if ttl.is_zero() {
            self.entries.remove(&key);
            return;
        }
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired.
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Like [`CacheStore::get`] but returns the whole entry, for callers
    /// that need the remaining TTL.
    pub fn get_entry(&mut self, key: &str) -> Option<CacheEntry> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.counters.record_miss();
                None
            }
            Some(entry) => {
                let entry = entry.clone();
                self.counters.record_hit();
                Some(entry)
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Invalidate ==
    /// Removes every entry when `pattern` is `None`, otherwise every entry
    /// whose key the pattern matches. Returns the number removed.
    pub fn invalidate(&mut self, pattern: Option<&KeyPattern>) -> usize {
        let before = self.entries.len();
        match pattern {
            None => self.entries.clear(),
            Some(pattern) => self.entries.retain(|key, _| !pattern.matches(key)),
        }
        before - self.entries.len()
    }

    // == Stats ==
    /// Returns current size, sorted keys and counters.
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            size: self.entries.len(),
            keys,
            hits: self.counters.hits,
            misses: self.counters.misses,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(120);

    #[test]
    fn test_store_new() {
        let store = CacheStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new();

        store.set("key1", json!({"count": 3}), TTL);
        let value = store.get("key1").unwrap();

        assert_eq!(value, json!({"count": 3}));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new();

        store.set("key1", json!("value1"), TTL);
        store.set("key1", json!("value2"), TTL);

        assert_eq!(store.get("key1").unwrap(), json!("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_zero_ttl_is_not_stored() {
        let mut store = CacheStore::new();

        store.set("key1", json!("value1"), TTL);
        store.set("key1", json!("value2"), Duration::ZERO);

        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiration_removes_entry() {
        let mut store = CacheStore::new();

        store.set("key1", json!("value1"), Duration::from_secs(1));
        assert!(store.get("key1").is_some());

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert!(store.get("key1").is_none());
        assert_eq!(store.len(), 0, "expired entry should be evicted on read");
    }

    #[test]
    fn test_store_invalidate_all() {
        let mut store = CacheStore::new();
        store.set("orders:a", json!(1), TTL);
        store.set("customers:a", json!(2), TTL);

        assert_eq!(store.invalidate(None), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_invalidate_by_substring() {
        let mut store = CacheStore::new();
        store.set("customers:https://a.test|", json!(1), TTL);
        store.set("customers:https://b.test|after=2024-01-01T00:00:00Z", json!(2), TTL);
        store.set("orders:https://a.test|", json!(3), TTL);

        let removed = store.invalidate(Some(&KeyPattern::from("customers:")));

        assert_eq!(removed, 2);
        assert_eq!(store.stats().keys, vec!["orders:https://a.test|".to_string()]);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new();

        store.set("b", json!(1), TTL);
        store.set("a", json!(2), TTL);
        store.get("a"); // hit
        store.get("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 2);
        assert_eq!(stats.keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_cleanup_expired() {
        let mut store = CacheStore::new();

        store.set("key1", json!(1), Duration::from_secs(1));
        store.set("key2", json!(2), Duration::from_secs(10));

        tokio::time::advance(Duration::from_millis(1100)).await;

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }
}
