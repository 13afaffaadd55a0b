//! Store credentials
//!
//! Identifies one WooCommerce store: its base URL and REST API key pair.

use std::fmt;

use reqwest::Url;

use crate::error::{AppError, Result};

/// Consumer key/secret for one store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Normalised base URL, no trailing slash
    pub url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl Credentials {
    /// Validates and normalises the credentials.
    ///
    /// The URL must be absolute http(s); surrounding whitespace and
    /// trailing slashes are dropped so one store always yields one cache
    /// key prefix.
    pub fn new(
        url: impl AsRef<str>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Result<Self> {
        let consumer_key = consumer_key.into().trim().to_string();
        let consumer_secret = consumer_secret.into().trim().to_string();
        if consumer_key.is_empty() || consumer_secret.is_empty() {
            return Err(AppError::Validation(
                "consumer key and secret are required".to_string(),
            ));
        }

        Ok(Self {
            url: normalize_store_url(url.as_ref())?,
            consumer_key,
            consumer_secret,
        })
    }
}

// Never print the secret
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

fn normalize_store_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::Validation("store url is required".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| AppError::Validation(format!("invalid store url: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(
            "store url must use http or https".to_string(),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(AppError::Validation("store url has no host".to_string()));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(AppError::Validation(
            "store url must not carry a query or fragment".to_string(),
        ));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
