//! WooCommerce REST client
//!
//! Thin reqwest wrapper over the store's `wp-json/wc/v3` API. The paginated
//! fetchers only see the [`PageSource`] trait, so tests can drive them
//! without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::woo::Credentials;

/// REST root below the store URL.
const API_ROOT: &str = "wp-json/wc/v3";

/// One page request against a list endpoint.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub endpoint: &'static str,
    pub page: u32,
    pub per_page: u32,
    pub orderby: &'static str,
    pub order: &'static str,
    pub filters: &'a [(&'static str, String)],
}

impl PageRequest<'_> {
    /// Query string pairs: paging first, then filters.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("orderby", self.orderby.to_string()),
            ("order", self.order.to_string()),
        ];
        query.extend(self.filters.iter().cloned());
        query
    }
}

/// Source of raw record pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Value>>;
}

/// Builds the shared HTTP client used for every store.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("woodash/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))
}

// == Woo Client ==
/// Client bound to one store's credentials.
#[derive(Debug, Clone)]
pub struct WooClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl WooClient {
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self { http, credentials }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.credentials.url, API_ROOT, endpoint)
    }

    /// Checks the key pair can read orders by asking for a single one.
    pub async fn verify(&self) -> Result<()> {
        let request = PageRequest {
            endpoint: "orders",
            page: 1,
            per_page: 1,
            orderby: "date",
            order: "desc",
            filters: &[],
        };
        self.fetch_page(&request).await.map(|_| ())
    }
}

#[async_trait]
impl PageSource for WooClient {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Value>> {
        debug!(
            store = %self.credentials.url,
            endpoint = request.endpoint,
            page = request.page,
            "fetching page"
        );

        let response = self
            .http
            .get(self.endpoint_url(request.endpoint))
            .basic_auth(
                &self.credentials.consumer_key,
                Some(&self.credentials.consumer_secret),
            )
            .query(&request.query())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::from_upstream_status(
                status.as_u16(),
                upstream_message(status, &body),
            ));
        }

        let body: Value = response.json().await?;
        match body {
            Value::Array(records) => Ok(records),
            other => Err(AppError::Upstream(format!(
                "expected a JSON array from '{}', got {}",
                request.endpoint,
                json_kind(&other)
            ))),
        }
    }
}

/// Prefers the `message` field of a WooCommerce error body.
fn upstream_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));

    match message {
        Some(message) => format!("{}: {}", status, message),
        None => format!("store responded with {}", status),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> WooClient {
        let credentials = Credentials::new(server.uri(), "ck_test", "cs_test").unwrap();
        let http = build_http_client(Duration::from_secs(5)).unwrap();
        WooClient::new(http, credentials)
    }

    fn orders_page<'a>(filters: &'a [(&'static str, String)]) -> PageRequest<'a> {
        PageRequest {
            endpoint: "orders",
            page: 2,
            per_page: 100,
            orderby: "date",
            order: "desc",
            filters,
        }
    }

    #[test]
    fn test_query_includes_paging_and_filters() {
        let filters = [("status", "completed".to_string())];
        let query = orders_page(&filters).query();
        assert_eq!(
            query,
            vec![
                ("per_page", "100".to_string()),
                ("page", "2".to_string()),
                ("orderby", "date".to_string()),
                ("order", "desc".to_string()),
                ("status", "completed".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_page_sends_auth_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wc/v3/orders"))
            .and(basic_auth("ck_test", "cs_test"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "100"))
            .and(query_param("status", "completed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let filters = [("status", "completed".to_string())];
        let records = client.fetch_page(&orders_page(&filters)).await.unwrap();

        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_upstream_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "woocommerce_rest_cannot_view",
                "message": "Sorry, you cannot list resources.",
                "data": {"status": 401}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.verify().await.unwrap_err();

        match err {
            AppError::UpstreamAuth(msg) => assert!(msg.contains("cannot list resources")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_page(&orders_page(&[])).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_non_array_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_page(&orders_page(&[])).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_unavailable() {
        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let credentials = Credentials::new(format!("http://{}", addr), "ck", "cs").unwrap();
        let client = WooClient::new(build_http_client(Duration::from_secs(2)).unwrap(), credentials);

        let err = client.verify().await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }
}
