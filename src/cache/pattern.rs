//! Key Pattern Module
//!
//! Selects cache keys for invalidation by substring or regular expression.

use regex::Regex;

use crate::error::{AppError, Result};

/// Matches cache keys during invalidation.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Matches any key containing the string
    Contains(String),
    /// Matches any key the expression finds a match in
    Regex(Regex),
    /// Matches keys every inner pattern matches
    AllOf(Vec<KeyPattern>),
}

impl KeyPattern {
    pub fn contains(needle: impl Into<String>) -> Self {
        KeyPattern::Contains(needle.into())
    }

    /// Compiles a regex pattern, rejecting invalid expressions.
    pub fn regex(expr: &str) -> Result<Self> {
        Regex::new(expr)
            .map(KeyPattern::Regex)
            .map_err(|e| AppError::Validation(format!("invalid key pattern: {}", e)))
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Contains(needle) => key.contains(needle.as_str()),
            KeyPattern::Regex(re) => re.is_match(key),
            KeyPattern::AllOf(patterns) => patterns.iter().all(|p| p.matches(key)),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(needle: &str) -> Self {
        KeyPattern::contains(needle)
    }
}
