//! Response DTOs for the dashboard API
//!
//! Every success body is wrapped in [`ApiResponse`]; errors use the envelope
//! built by `AppError`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::api::session::Session;
use crate::cache::{CacheStats, Cached};
use crate::woo::{FetchOutcome, Record};

/// `{ success: true, data, meta? }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    pub fn with_meta(data: T, meta: ResponseMeta) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

/// Cache provenance of a response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub cached: bool,
    /// Seconds until the backing cache entry expires
    pub cache_expiry: u64,
    pub timestamp: String,
}

impl ResponseMeta {
    pub fn from_cached<T>(cached: &Cached<T>) -> Self {
        Self {
            cached: cached.hit,
            cache_expiry: cached.expires_in.as_secs(),
            timestamp: now_rfc3339(),
        }
    }
}

/// `{ <entity>: [...], count, truncated }`, keyed by the record's endpoint.
#[derive(Debug, Clone)]
pub struct EntityList<T> {
    pub entity: &'static str,
    pub items: Vec<T>,
    pub truncated: bool,
}

impl<R: Record> From<FetchOutcome<R>> for EntityList<R> {
    fn from(outcome: FetchOutcome<R>) -> Self {
        Self {
            entity: R::ENDPOINT,
            items: outcome.items,
            truncated: outcome.truncated,
        }
    }
}

impl<T: Serialize> Serialize for EntityList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.entity, &self.items)?;
        map.serialize_entry("count", &self.items.len())?;
        map.serialize_entry("truncated", &self.truncated)?;
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub store_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            store_url: session.store_url().to_string(),
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub size: usize,
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            size: stats.size,
            keys: stats.keys,
            hits: stats.hits,
            misses: stats.misses,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: now_rfc3339(),
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
