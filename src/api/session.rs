//! Dashboard Sessions
//!
//! In-memory session table keyed by an opaque cookie. Each session carries
//! the store credentials the user signed in with.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::woo::{Credentials, WooClient};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "woodash_session";

/// A signed-in dashboard user.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn store_url(&self) -> &str {
        &self.credentials.url
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Upstream client for this session's store.
    pub fn client(&self, http: &reqwest::Client) -> WooClient {
        WooClient::new(http.clone(), self.credentials.clone())
    }
}

// == Session Store ==
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365)),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub async fn create(&self, credentials: Credentials) -> Session {
        let created_at = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            credentials,
            created_at,
            expires_at: created_at
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    /// Live session for `id`; an expired one is dropped on the way.
    pub async fn get(&self, id: &Uuid) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if !session.is_expired_at(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.sessions.write().await.remove(id);
        None
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Utc::now()).await
    }

    pub async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// == Cookies ==
pub fn session_cookie(session: &Session, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Cookie that tells the browser to forget the session.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

fn session_id(parts: &Parts) -> Option<Uuid> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

// == Extractor ==
#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(id) = session_id(parts) else {
            return Err(AppError::Unauthorized("not signed in".to_string()));
        };

        let sessions = SessionStore::from_ref(state);
        match sessions.get(&id).await {
            Some(session) => Ok(session),
            None => {
                debug!(session = %id, "unknown or expired session");
                Err(AppError::Unauthorized(
                    "session expired, sign in again".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};

    fn credentials() -> Credentials {
        Credentials::new("https://shop.example", "ck_1", "cs_1").unwrap()
    }

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(credentials()).await;

        let found = store.get(&session.id).await.unwrap();
        assert_eq!(found.store_url(), "https://shop.example");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(credentials()).await;

        assert!(store.remove(&session.id).await.is_some());
        assert!(store.get(&session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(credentials()).await;

        assert_eq!(store.cleanup_expired_at(session.created_at).await, 0);
        let later = session.expires_at + chrono::Duration::seconds(1);
        assert_eq!(store.cleanup_expired_at(later).await, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_session_is_never_live() {
        let store = SessionStore::new(Duration::ZERO);
        let session = store.create(credentials()).await;

        assert!(store.get(&session.id).await.is_none());
        assert_eq!(store.len().await, 0, "lookup drops the expired session");
    }

    #[test]
    fn test_cookie_attributes() {
        let session = Session {
            id: Uuid::new_v4(),
            credentials: credentials(),
            created_at: Utc::now(),
            expires_at: Utc::now(),
        };

        let cookie = session_cookie(&session, chrono::Duration::hours(8), false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with(&format!("{}={}", SESSION_COOKIE, session.id)));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=28800"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let parts = parts_with_cookie(&format!("theme=dark; {}={}", SESSION_COOKIE, id));
        assert_eq!(session_id(&parts), Some(id));

        let parts = parts_with_cookie(&format!("{}=not-a-uuid", SESSION_COOKIE));
        assert_eq!(session_id(&parts), None);
    }

    #[tokio::test]
    async fn test_extractor_rejects_unknown_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let mut parts = parts_with_cookie(&format!("{}={}", SESSION_COOKIE, Uuid::new_v4()));

        let result = Session::from_request_parts(&mut parts, &store).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_extractor_accepts_live_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(credentials()).await;
        let mut parts = parts_with_cookie(&format!("{}={}", SESSION_COOKIE, session.id));

        let found = Session::from_request_parts(&mut parts, &store).await.unwrap();
        assert_eq!(found.id, session.id);
    }
}
