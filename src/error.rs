//! Error types for the dashboard service
//!
//! Provides unified error handling using thiserror. Every variant carries
//! owned strings so a result can be cloned and handed to every request
//! waiting on the same in-flight fetch.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

// == App Error Enum ==
/// Unified error type for the dashboard service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Query or body failed validation
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No session, or the session has expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The store rejected the consumer key/secret
    #[error("Store rejected credentials: {0}")]
    UpstreamAuth(String),

    /// The store could not be reached (connect failure, timeout)
    #[error("Store unreachable: {0}")]
    UpstreamUnavailable(String),

    /// The store answered with an unexpected status or body
    #[error("Store error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code used in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::UpstreamAuth(_) => "UPSTREAM_AUTH_FAILED",
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::UpstreamAuth(_) => StatusCode::UNAUTHORIZED,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::UpstreamAuth(msg)
            | AppError::UpstreamUnavailable(msg)
            | AppError::Upstream(msg)
            | AppError::Internal(msg) => msg,
        }
    }

    /// Extra context for the client. Internal details are never exposed.
    fn details(&self) -> Option<Value> {
        match self {
            AppError::UpstreamAuth(_) => Some(json!({
                "hint": "check the consumer key and secret and their read permission"
            })),
            _ => None,
        }
    }
}

// == Upstream Error Classification ==
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return AppError::UpstreamUnavailable(err.to_string());
        }
        if let Some(status) = err.status() {
            return AppError::from_upstream_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return AppError::Upstream(format!("malformed response: {}", err));
        }
        AppError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization failed: {}", err))
    }
}

impl AppError {
    /// Maps a non-success upstream HTTP status to the error taxonomy.
    pub fn from_upstream_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => AppError::UpstreamAuth(message),
            502..=504 => AppError::UpstreamUnavailable(message),
            _ => AppError::Upstream(message),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        }

        let mut error = json!({
            "code": self.code(),
            "message": self.message(),
        });
        if let Some(details) = self.details() {
            error["details"] = details;
        }

        let body = Json(json!({
            "success": false,
            "error": error
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the dashboard service.
pub type Result<T> = std::result::Result<T, AppError>;
