//! Cache Module
//!
//! Provides the in-memory TTL cache and the cache-aside wrapper that sits
//! between the route handlers and the store's REST API.

mod entry;
pub mod key;
mod pattern;
mod service;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::cache_key;
pub use pattern::KeyPattern;
pub use service::{CacheService, Cached};
pub use stats::CacheStats;
pub use store::CacheStore;
