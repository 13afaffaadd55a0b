//! Woodash - WooCommerce dashboard data service
//!
//! Fetches orders, customers and products from a store's REST API, keeps
//! them in an in-memory TTL cache and serves them to the dashboard.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod tasks;
pub mod woo;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::spawn_cleanup_task;
