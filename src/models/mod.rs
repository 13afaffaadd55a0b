//! Request and response models for the dashboard API

pub mod requests;
pub mod responses;

pub use requests::{InvalidateQuery, LoginRequest, OrdersQuery, RangeQuery};
pub use responses::{
    ApiResponse, EntityList, HealthResponse, InvalidateResponse, LogoutResponse, ResponseMeta,
    SessionResponse, StatsResponse,
};
