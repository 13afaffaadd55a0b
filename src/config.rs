//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Cache TTL in seconds for the order list
    pub orders_ttl: u64,
    /// Cache TTL in seconds for the customer list
    pub customers_ttl: u64,
    /// Cache TTL in seconds for the product list
    pub products_ttl: u64,
    /// Session lifetime in seconds
    pub session_ttl: u64,
    /// Timeout in seconds for a single upstream request
    pub upstream_timeout: u64,
    /// Share one upstream fetch between concurrent misses on the same key
    pub coalesce_misses: bool,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `ORDERS_TTL` - Order list TTL in seconds (default: 120)
    /// - `CUSTOMERS_TTL` - Customer list TTL in seconds (default: 180)
    /// - `PRODUCTS_TTL` - Product list TTL in seconds (default: 300)
    /// - `SESSION_TTL` - Session lifetime in seconds (default: 28800)
    /// - `UPSTREAM_TIMEOUT` - Upstream request timeout in seconds (default: 30)
    /// - `COALESCE_MISSES` - Single-flight cache misses (default: true)
    /// - `SECURE_COOKIES` - Send the session cookie only over HTTPS (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            orders_ttl: positive(env_or("ORDERS_TTL", defaults.orders_ttl), defaults.orders_ttl),
            customers_ttl: positive(
                env_or("CUSTOMERS_TTL", defaults.customers_ttl),
                defaults.customers_ttl,
            ),
            products_ttl: positive(
                env_or("PRODUCTS_TTL", defaults.products_ttl),
                defaults.products_ttl,
            ),
            session_ttl: positive(env_or("SESSION_TTL", defaults.session_ttl), defaults.session_ttl),
            upstream_timeout: positive(
                env_or("UPSTREAM_TIMEOUT", defaults.upstream_timeout),
                defaults.upstream_timeout,
            ),
            coalesce_misses: env_or("COALESCE_MISSES", defaults.coalesce_misses),
            secure_cookies: env_or("SECURE_COOKIES", defaults.secure_cookies),
        }
    }

    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 60,
            orders_ttl: 120,
            customers_ttl: 180,
            products_ttl: 300,
            session_ttl: 8 * 60 * 60,
            upstream_timeout: 30,
            coalesce_misses: true,
            secure_cookies: false,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// TTLs of zero would make every entry expire on insert
fn positive(value: u64, default: u64) -> u64 {
    if value == 0 {
        default
    } else {
        value
    }
}
