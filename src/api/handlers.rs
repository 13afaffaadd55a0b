//! API Handlers
//!
//! HTTP request handlers for the dashboard API. List handlers validate the
//! query before touching the cache, then serve through the cache-aside
//! wrapper around the matching paginated fetcher.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRef, FromRequestParts, Query, State,
    },
    http::{header, request::Parts},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::session::{removal_cookie, session_cookie, Session, SessionStore};
use crate::cache::{cache_key, CacheService, Cached};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::metrics::{summarize, DashboardSummary};
use crate::models::{
    ApiResponse, EntityList, HealthResponse, InvalidateQuery, InvalidateResponse, LoginRequest,
    LogoutResponse, OrdersQuery, RangeQuery, ResponseMeta, SessionResponse, StatsResponse,
};
use crate::woo::{
    build_http_client, fetch_customers, fetch_orders, fetch_products, Customer, FetchOutcome,
    FetchParams, Order, Product, Record, WooClient,
};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: CacheService,
    pub sessions: SessionStore,
    /// Shared connection pool for every store
    pub http: reqwest::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        Self {
            cache: CacheService::new(config.coalesce_misses),
            sessions: SessionStore::new(Duration::from_secs(config.session_ttl)),
            http,
            config: Arc::new(config),
        }
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let http = build_http_client(config.upstream_timeout())?;
        Ok(Self::new(config, http))
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

// == Query Extraction ==
/// `Query` whose rejection comes back in the error envelope.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::Validation(e.body_text()))?;
        Ok(Self(value))
    }
}

// == Entity Lists ==
/// Handler for GET /api/orders
pub async fn orders_handler(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(query): ValidQuery<OrdersQuery>,
) -> Result<Response> {
    let params = query.params()?;
    let ttl = Duration::from_secs(state.config.orders_ttl);
    let cached = load_orders(&state, &session, &params, ttl).await?;
    Ok(list_response(cached, ttl))
}

/// Handler for GET /api/customers
pub async fn customers_handler(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(query): ValidQuery<RangeQuery>,
) -> Result<Response> {
    let params = query.params()?;
    let ttl = Duration::from_secs(state.config.customers_ttl);
    let cached = load_customers(&state, &session, &params, ttl).await?;
    Ok(list_response(cached, ttl))
}

/// Handler for GET /api/products
pub async fn products_handler(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(query): ValidQuery<RangeQuery>,
) -> Result<Response> {
    let params = query.params()?;
    let ttl = Duration::from_secs(state.config.products_ttl);
    let cached = load_products(&state, &session, &params, ttl).await?;
    Ok(list_response(cached, ttl))
}

/// Handler for GET /api/dashboard/summary
///
/// The three underlying lists go through their own cache entries, so the
/// summary shares upstream fetches with the list endpoints.
pub async fn summary_handler(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(query): ValidQuery<RangeQuery>,
) -> Result<Response> {
    let params = query.params()?;
    let ttl = Duration::from_secs(state.config.orders_ttl);
    let key = cache_key("summary", session.store_url(), params.pairs());

    let cached = state
        .cache
        .with_cache(&key, ttl, || async {
            let (orders, customers, products) = tokio::try_join!(
                load_orders(&state, &session, &params, ttl),
                load_customers(
                    &state,
                    &session,
                    &params,
                    Duration::from_secs(state.config.customers_ttl)
                ),
                load_products(
                    &state,
                    &session,
                    &params,
                    Duration::from_secs(state.config.products_ttl)
                ),
            )?;

            let mut summary = summarize(
                &orders.value.items,
                &customers.value.items,
                &products.value.items,
            );
            summary.truncated =
                orders.value.truncated || customers.value.truncated || products.value.truncated;
            Ok::<DashboardSummary, AppError>(summary)
        })
        .await?;

    let meta = ResponseMeta::from_cached(&cached);
    Ok(cached_json(ApiResponse::with_meta(cached.value, meta), ttl))
}

async fn load_orders(
    state: &AppState,
    session: &Session,
    params: &FetchParams,
    ttl: Duration,
) -> Result<Cached<FetchOutcome<Order>>> {
    let client = session.client(&state.http);
    let key = cache_key(Order::ENDPOINT, session.store_url(), params.pairs());
    state
        .cache
        .with_cache(&key, ttl, || async { fetch_orders(&client, params).await })
        .await
}

async fn load_customers(
    state: &AppState,
    session: &Session,
    params: &FetchParams,
    ttl: Duration,
) -> Result<Cached<FetchOutcome<Customer>>> {
    let params = params.without_status();
    let client = session.client(&state.http);
    let key = cache_key(Customer::ENDPOINT, session.store_url(), params.pairs());
    state
        .cache
        .with_cache(&key, ttl, || async { fetch_customers(&client, &params).await })
        .await
}

async fn load_products(
    state: &AppState,
    session: &Session,
    params: &FetchParams,
    ttl: Duration,
) -> Result<Cached<FetchOutcome<Product>>> {
    let params = params.without_status();
    let client = session.client(&state.http);
    let key = cache_key(Product::ENDPOINT, session.store_url(), params.pairs());
    state
        .cache
        .with_cache(&key, ttl, || async { fetch_products(&client, &params).await })
        .await
}

fn list_response<R: Record>(cached: Cached<FetchOutcome<R>>, ttl: Duration) -> Response {
    let meta = ResponseMeta::from_cached(&cached);
    cached_json(ApiResponse::with_meta(EntityList::from(cached.value), meta), ttl)
}

fn cached_json<T: Serialize>(body: ApiResponse<T>, ttl: Duration) -> Response {
    (
        [(
            header::CACHE_CONTROL,
            format!("private, max-age={}", ttl.as_secs()),
        )],
        Json(body),
    )
        .into_response()
}

// == Auth ==
/// Handler for POST /api/auth/login
///
/// Verifies the key pair against the store before creating a session.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>)> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let credentials = request.into_credentials()?;

    let client = WooClient::new(state.http.clone(), credentials.clone());
    if let Err(err) = client.verify().await {
        warn!(store = %credentials.url, code = err.code(), "login rejected");
        return Err(err);
    }

    let session = state.sessions.create(credentials).await;
    info!(store = %session.store_url(), "session created");

    let cookie = session_cookie(&session, state.sessions.ttl(), state.config.secure_cookies);
    Ok((
        jar.add(cookie),
        Json(ApiResponse::ok(SessionResponse::from(&session))),
    ))
}

/// Handler for POST /api/auth/logout
pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<LogoutResponse>>) {
    state.sessions.remove(&session.id).await;
    let removed = state.cache.invalidate_store(session.store_url()).await;
    info!(store = %session.store_url(), removed, "session closed");

    (
        jar.remove(removal_cookie()),
        Json(ApiResponse::ok(LogoutResponse {
            message: "signed out".to_string(),
        })),
    )
}

/// Handler for GET /api/auth/session
pub async fn session_handler(session: Session) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::ok(SessionResponse::from(&session)))
}

// == Cache Introspection ==
/// Handler for GET /api/cache/stats
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    session: Session,
) -> Json<ApiResponse<StatsResponse>> {
    let stats = state.cache.store_stats(session.store_url()).await;
    Json(ApiResponse::ok(StatsResponse::from(stats)))
}

/// Handler for DELETE /api/cache
pub async fn invalidate_handler(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(query): ValidQuery<InvalidateQuery>,
) -> Result<Json<ApiResponse<InvalidateResponse>>> {
    let narrow = query.patterns()?;
    let removed = state
        .cache
        .invalidate_store_matching(session.store_url(), narrow)
        .await;
    info!(store = %session.store_url(), removed, "cache invalidated");

    Ok(Json(ApiResponse::ok(InvalidateResponse { removed })))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::woo::Credentials;

    fn test_state() -> AppState {
        AppState::from_config(Config::default()).unwrap()
    }

    async fn signed_in(state: &AppState, url: &str) -> Session {
        let credentials = Credentials::new(url, "ck_test", "cs_test").unwrap();
        state.sessions.create(credentials).await
    }

    #[tokio::test]
    async fn test_validation_runs_before_cache() {
        let state = test_state();
        let session = signed_in(&state, "https://shop.example").await;

        let query = OrdersQuery {
            after: Some("2024-02-01".to_string()),
            before: Some("2024-01-01".to_string()),
            status: None,
        };
        let result = orders_handler(State(state.clone()), session, ValidQuery(query)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        let stats = state.cache.stats().await;
        assert_eq!(stats.hits + stats.misses, 0, "cache was never consulted");
    }

    #[tokio::test]
    async fn test_orders_served_from_cache() {
        let state = test_state();
        let session = signed_in(&state, "https://shop.example").await;
        let outcome = FetchOutcome::<Order> {
            items: vec![serde_json::from_value(serde_json::json!({"id": 7})).unwrap()],
            pages: 1,
            truncated: false,
        };
        state
            .cache
            .set(
                "orders:https://shop.example|",
                serde_json::to_value(&outcome).unwrap(),
                Duration::from_secs(60),
            )
            .await;

        let response = orders_handler(State(state), session, ValidQuery(OrdersQuery::default()))
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "private, max-age=120"
        );
    }

    #[tokio::test]
    async fn test_invalidate_handler_scoped_to_session_store() {
        let state = test_state();
        let session = signed_in(&state, "https://a.test").await;
        let ttl = Duration::from_secs(60);
        state.cache.set("orders:https://a.test|", serde_json::Value::Null, ttl).await;
        state.cache.set("orders:https://b.test|", serde_json::Value::Null, ttl).await;

        let Json(body) = invalidate_handler(
            State(state.clone()),
            session,
            ValidQuery(InvalidateQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(body.data.removed, 1);
        assert_eq!(state.cache.stats().await.size, 1);
    }

    #[tokio::test]
    async fn test_logout_drops_session() {
        let state = test_state();
        let session = signed_in(&state, "https://a.test").await;
        let id = session.id;

        let _ = logout_handler(State(state.clone()), session, CookieJar::new()).await;

        assert!(state.sessions.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
