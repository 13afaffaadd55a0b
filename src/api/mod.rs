//! API Module
//!
//! HTTP handlers, routing and sessions for the dashboard REST API.

pub mod handlers;
pub mod routes;
pub mod session;

pub use handlers::AppState;
pub use routes::create_router;
pub use session::{Session, SessionStore};
