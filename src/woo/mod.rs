//! WooCommerce Module
//!
//! Upstream access to a store's REST API: credentials, the HTTP client,
//! typed records and the paginated fetchers built on them.

pub mod client;
mod credentials;
mod models;
pub mod paginate;
mod params;

pub use client::{build_http_client, PageRequest, PageSource, WooClient};
pub use credentials::Credentials;
pub use models::{Customer, Order, Product, Record};
pub use paginate::{fetch_customers, fetch_orders, fetch_products, FetchOutcome};
pub use params::{FetchParams, ORDER_STATUSES};
