//! Request DTOs for the dashboard API
//!
//! Query values are taken as raw strings so malformed input reaches our
//! own validation and comes back in the standard error envelope.

use serde::Deserialize;

use crate::cache::KeyPattern;
use crate::error::Result;
use crate::woo::{Credentials, FetchParams};

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
}

impl LoginRequest {
    pub fn into_credentials(self) -> Result<Credentials> {
        Credentials::new(self.url, self.consumer_key, self.consumer_secret)
    }
}

/// `?after&before&status` on the order list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersQuery {
    pub after: Option<String>,
    pub before: Option<String>,
    pub status: Option<String>,
}

impl OrdersQuery {
    pub fn params(&self) -> Result<FetchParams> {
        FetchParams::parse(
            self.after.as_deref(),
            self.before.as_deref(),
            self.status.as_deref(),
        )
    }
}

/// `?after&before` on lists without a status filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub after: Option<String>,
    pub before: Option<String>,
}

impl RangeQuery {
    pub fn params(&self) -> Result<FetchParams> {
        FetchParams::parse(self.after.as_deref(), self.before.as_deref(), None)
    }
}

/// `?pattern=&regex=` on `DELETE /api/cache`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    /// Substring the key must contain
    pub pattern: Option<String>,
    /// Expression the key must match
    pub regex: Option<String>,
}

impl InvalidateQuery {
    /// Narrowing patterns beyond the caller's store; empty values are ignored.
    pub fn patterns(&self) -> Result<Vec<KeyPattern>> {
        let mut patterns = Vec::new();
        if let Some(needle) = non_empty(&self.pattern) {
            patterns.push(KeyPattern::contains(needle));
        }
        if let Some(expr) = non_empty(&self.regex) {
            patterns.push(KeyPattern::regex(expr)?);
        }
        Ok(patterns)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
