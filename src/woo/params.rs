//! Fetch parameters
//!
//! Validated filters for a list request. The same pairs are sent upstream
//! and folded into the cache key.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{AppError, Result};

/// Order statuses the store accepts as a `status` filter.
pub const ORDER_STATUSES: &[&str] = &[
    "any",
    "pending",
    "processing",
    "on-hold",
    "completed",
    "cancelled",
    "refunded",
    "failed",
    "trash",
];

/// Filters for one list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    /// Only honoured by the order list
    pub status: Option<String>,
}

impl FetchParams {
    /// Parses raw query values.
    ///
    /// Dates accept RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC). An empty
    /// value counts as absent.
    pub fn parse(after: Option<&str>, before: Option<&str>, status: Option<&str>) -> Result<Self> {
        let after = parse_date("after", after)?;
        let before = parse_date("before", before)?;

        if let (Some(after), Some(before)) = (after, before) {
            if after > before {
                return Err(AppError::Validation(
                    "'after' must not be later than 'before'".to_string(),
                ));
            }
        }

        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(status) if ORDER_STATUSES.contains(&status) => Some(status.to_string()),
            Some(status) => {
                return Err(AppError::Validation(format!(
                    "unknown order status '{}', expected one of: {}",
                    status,
                    ORDER_STATUSES.join(", ")
                )))
            }
            None => None,
        };

        Ok(Self {
            after,
            before,
            status,
        })
    }

    /// Date range only, for lists that have no status filter.
    pub fn without_status(&self) -> Self {
        Self {
            status: None,
            ..self.clone()
        }
    }

    /// Name/value pairs sent upstream, absent filters omitted.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(after) = self.after {
            pairs.push(("after", format_date(after)));
        }
        if let Some(before) = self.before {
            pairs.push(("before", format_date(before)));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}

fn parse_date(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Some(midnight.and_utc()));
        }
    }

    Err(AppError::Validation(format!(
        "'{}' must be an RFC 3339 date-time or YYYY-MM-DD, got '{}'",
        name, raw
    )))
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
