//! API Routes
//!
//! Configures the Axum router with every dashboard endpoint.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, customers_handler, health_handler, invalidate_handler, login_handler,
    logout_handler, orders_handler, products_handler, session_handler, summary_handler, AppState,
};

/// Creates the main router.
///
/// # Endpoints
/// - `GET /api/orders`, `/api/customers`, `/api/products` - cached entity lists
/// - `GET /api/dashboard/summary` - metric cards
/// - `POST /api/auth/login`, `POST /api/auth/logout`, `GET /api/auth/session`
/// - `GET /api/cache/stats`, `DELETE /api/cache`
/// - `GET /health`
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/orders", get(orders_handler))
        .route("/customers", get(customers_handler))
        .route("/products", get(products_handler))
        .route("/dashboard/summary", get(summary_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/session", get(session_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache", delete(invalidate_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::session::SESSION_COOKIE;
    use crate::config::Config;
    use crate::woo::Credentials;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, AppState) {
        let state = AppState::from_config(Config::default()).unwrap();
        (create_router(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_orders_require_session() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_session_endpoint_with_cookie() {
        let (app, state) = create_test_app();
        let credentials = Credentials::new("https://shop.example", "ck", "cs").unwrap();
        let session = state.sessions.create(credentials).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/session")
                    .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["storeUrl"], "https://shop.example");
    }

    #[tokio::test]
    async fn test_bad_status_is_validation_error() {
        let (app, state) = create_test_app();
        let credentials = Credentials::new("https://shop.example", "ck", "cs").unwrap();
        let session = state.sessions.create(credentials).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders?status=shipped")
                    .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_duplicate_query_field_is_validation_error() {
        let (app, state) = create_test_app();
        let credentials = Credentials::new("https://shop.example", "ck", "cs").unwrap();
        let session = state.sessions.create(credentials).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/cache?pattern=orders&pattern=products")
                    .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_login_body() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
