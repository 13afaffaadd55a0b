//! Cache Service Module
//!
//! Shared handle over the cache store plus the cache-aside wrapper used by
//! the route handlers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::cache::key::store_fragment;
use crate::cache::{CacheStats, CacheStore, KeyPattern};
use crate::error::Result;

type FlightResult = Result<Value>;
type InFlight = Arc<Mutex<HashMap<String, broadcast::Sender<FlightResult>>>>;

/// A value returned by [`CacheService::with_cache`].
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    /// `true` when served from the cache without running the producer
    pub hit: bool,
    /// Time until the entry backing this value expires
    pub expires_in: Duration,
}

// == Cache Service ==
/// Cheap-to-clone handle shared by every request through axum state.
#[derive(Debug, Clone)]
pub struct CacheService {
    store: Arc<RwLock<CacheStore>>,
    in_flight: InFlight,
    coalesce_misses: bool,
}

impl CacheService {
    pub fn new(coalesce_misses: bool) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            coalesce_misses,
        }
    }

    // == Store Operations ==
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store.write().await.get(key)
    }

    pub async fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.store.write().await.set(key, value, ttl);
    }

    pub async fn invalidate(&self, pattern: Option<&KeyPattern>) -> usize {
        self.store.write().await.invalidate(pattern)
    }

    /// Drops every entry cached for one store.
    pub async fn invalidate_store(&self, store_url: &str) -> usize {
        self.invalidate_store_matching(store_url, Vec::new()).await
    }

    /// Drops one store's entries that also match every `narrow` pattern.
    pub async fn invalidate_store_matching(&self, store_url: &str, narrow: Vec<KeyPattern>) -> usize {
        let mut patterns = vec![KeyPattern::contains(store_fragment(store_url))];
        patterns.extend(narrow);
        self.invalidate(Some(&KeyPattern::AllOf(patterns))).await
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Stats with size and keys limited to one store. Hit and miss counters
    /// stay process-wide.
    pub async fn store_stats(&self, store_url: &str) -> CacheStats {
        let fragment = store_fragment(store_url);
        let mut stats = self.stats().await;
        stats.keys.retain(|key| key.contains(&fragment));
        stats.size = stats.keys.len();
        stats
    }

    /// Removes expired entries regardless of access pattern.
    pub async fn sweep(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    // == Cache-Aside ==
    /// Returns the cached value for `key` if fresh; otherwise runs
    /// `producer`, caches its successful result for `ttl` and returns it.
    ///
    /// Producer errors propagate and are never cached. With miss coalescing
    /// enabled, concurrent misses on one key share a single producer run.
    pub async fn with_cache<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<Cached<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        if let Some(cached) = self.lookup(key).await? {
            debug!(key, "cache hit");
            return Ok(cached);
        }
        debug!(key, "cache miss");

        if !self.coalesce_misses {
            return self.produce(key, ttl, producer).await;
        }

        match self.join_flight(key) {
            Flight::Leader(guard) => {
                // A previous leader may have filled the entry between our
                // lookup and taking the lead.
                if let Some(cached) = self.lookup(key).await? {
                    guard.finish(Ok(serde_json::to_value(&cached.value)?));
                    return Ok(cached);
                }

                let produced = self.produce(key, ttl, producer).await;
                match &produced {
                    Ok(cached) => guard.finish(Ok(serde_json::to_value(&cached.value)?)),
                    Err(err) => guard.finish(Err(err.clone())),
                }
                produced
            }
            Flight::Follower(mut rx) => match rx.recv().await {
                Ok(Ok(json)) => {
                    debug!(key, "joined in-flight fetch");
                    Ok(Cached {
                        value: serde_json::from_value(json)?,
                        hit: false,
                        expires_in: ttl,
                    })
                }
                Ok(Err(err)) => Err(err),
                // Leader was dropped before finishing
                Err(_) => self.produce(key, ttl, producer).await,
            },
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Cached<T>>> {
        let entry = self.store.write().await.get_entry(key);
        match entry {
            Some(entry) => Ok(Some(Cached {
                expires_in: entry.ttl_remaining(),
                value: serde_json::from_value(entry.value)?,
                hit: true,
            })),
            None => Ok(None),
        }
    }

    async fn produce<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<Cached<T>>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let value = producer().await?;
        let json = serde_json::to_value(&value)?;
        self.set(key, json, ttl).await;
        Ok(Cached {
            value,
            hit: false,
            expires_in: ttl,
        })
    }

    fn join_flight(&self, key: &str) -> Flight {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = in_flight.get(key) {
            return Flight::Follower(tx.subscribe());
        }

        let (tx, _) = broadcast::channel(1);
        in_flight.insert(key.to_string(), tx.clone());
        Flight::Leader(FlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            key: key.to_string(),
            sender: Some(tx),
        })
    }
}

enum Flight {
    Leader(FlightGuard),
    Follower(broadcast::Receiver<FlightResult>),
}

/// Owns a key's slot in the in-flight table; releases it on finish or drop.
struct FlightGuard {
    in_flight: InFlight,
    key: String,
    sender: Option<broadcast::Sender<FlightResult>>,
}

impl FlightGuard {
    fn finish(mut self, result: FlightResult) {
        self.release();
        if let Some(tx) = self.sender.take() {
            // No followers is fine
            let _ = tx.send(result);
        }
    }

    fn release(&self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.release();
        }
    }
}
