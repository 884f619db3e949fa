//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cookie::Cookie;
use http::header::{COOKIE, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use shopify_embedded_auth::auth::oauth::{AuthQuery, AuthorizationRequest, OAuthError, OAuthProvider};
use shopify_embedded_auth::clients::{HttpError, ShopProbe};
use shopify_embedded_auth::{
    ApiKey, ApiSecretKey, AuthConfig, AuthConfigBuilder, AuthRequest, HostUrl, Session,
    SessionStore, SessionStoreError, ShopDomain,
};

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-secret";
pub const SCOPES: &str = "read_products,write_orders";
pub const CHROME_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const SAFARI_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";

/// Builder preloaded with credentials, host and scopes.
pub fn config_builder() -> AuthConfigBuilder {
    AuthConfig::builder()
        .api_key(ApiKey::new(API_KEY).unwrap())
        .api_secret_key(ApiSecretKey::new(API_SECRET).unwrap())
        .host(HostUrl::new("https://myapp.example.com").unwrap())
        .scopes(SCOPES.parse().unwrap())
}

pub fn create_test_config() -> Arc<AuthConfig> {
    Arc::new(config_builder().build().unwrap())
}

/// A valid, non-expiring session for `shop` with the configured scopes.
pub fn session_for(shop: &str) -> Session {
    let shop = ShopDomain::new(shop).unwrap();
    Session::new(
        Session::offline_id(&shop),
        shop,
        "shpat_valid".to_string(),
        SCOPES.parse().unwrap(),
        false,
        None,
    )
}

/// Builds a request view from a path, query string, cookies and user agent.
pub fn request(path: &str, query: &str, cookies: &str, user_agent: Option<&str>) -> AuthRequest {
    let mut headers = HeaderMap::new();
    if !cookies.is_empty() {
        headers.insert(COOKIE, HeaderValue::from_str(cookies).unwrap());
    }
    if let Some(agent) = user_agent {
        headers.insert(USER_AGENT, HeaderValue::from_str(agent).unwrap());
    }
    let query = (!query.is_empty()).then_some(query);
    AuthRequest::new(path, query, headers)
}

/// Returns every `Set-Cookie` value of a response.
pub fn set_cookies<B>(response: &http::Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Session store holding at most one "current" session.
#[derive(Default)]
pub struct MemoryStore {
    current: Mutex<Option<Session>>,
    pub stored: Mutex<Vec<Session>>,
    pub deletes: AtomicUsize,
    pub fail_deletes: bool,
    pub gone_on_delete: bool,
}

impl MemoryStore {
    pub fn with_session(session: Session) -> Self {
        Self {
            current: Mutex::new(Some(session)),
            ..Self::default()
        }
    }

    /// A store whose deletes fail with a backend error.
    pub fn failing_deletes(session: Session) -> Self {
        Self {
            fail_deletes: true,
            ..Self::with_session(session)
        }
    }

    /// A store whose session disappears before the delete lands.
    pub fn racing_delete(session: Session) -> Self {
        Self {
            gone_on_delete: true,
            ..Self::with_session(session)
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_current_session(
        &self,
        _request: &AuthRequest,
        _is_online: bool,
    ) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.current())
    }

    async fn delete_current_session(
        &self,
        _request: &AuthRequest,
        _is_online: bool,
    ) -> Result<(), SessionStoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(SessionStoreError::Backend("disk full".to_string()));
        }
        if self.gone_on_delete {
            self.current.lock().unwrap().take();
            return Err(SessionStoreError::NotFound);
        }
        match self.current.lock().unwrap().take() {
            Some(_) => Ok(()),
            None => Err(SessionStoreError::NotFound),
        }
    }

    async fn store_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.stored.lock().unwrap().push(session.clone());
        *self.current.lock().unwrap() = Some(session.clone());
        Ok(())
    }
}

type CallbackResult = Box<dyn Fn() -> Result<Session, OAuthError> + Send + Sync>;

/// OAuth provider with a fixed authorization URL and a scripted callback.
pub struct FakeOAuth {
    callback: CallbackResult,
    pub begins: AtomicUsize,
}

impl FakeOAuth {
    pub fn succeeding(session: Session) -> Self {
        Self::with(move || Ok(session.clone()))
    }

    pub fn with(callback: impl Fn() -> Result<Session, OAuthError> + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
            begins: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OAuthProvider for FakeOAuth {
    fn begin_auth(
        &self,
        shop: &ShopDomain,
        callback_path: &str,
        is_online: bool,
    ) -> Result<AuthorizationRequest, OAuthError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(AuthorizationRequest {
            auth_url: format!(
                "{}/admin/oauth/authorize?callback={callback_path}&online={is_online}",
                shop.origin()
            ),
            cookies: vec![Cookie::new("oauth_state", "nonce")],
        })
    }

    async fn validate_callback(
        &self,
        _request: &AuthRequest,
        _query: &AuthQuery,
    ) -> Result<Session, OAuthError> {
        (self.callback)()
    }
}

type ProbeResult = Box<dyn Fn() -> Result<(), HttpError> + Send + Sync>;

/// Probe returning a scripted result and counting calls.
pub struct FakeProbe {
    result: ProbeResult,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn ok() -> Self {
        Self::with(|| Ok(()))
    }

    pub fn status(code: u16) -> Self {
        Self::with(move || {
            Err(HttpError::Response {
                code,
                message: format!("status {code}"),
            })
        })
    }

    pub fn with(result: impl Fn() -> Result<(), HttpError> + Send + Sync + 'static) -> Self {
        Self {
            result: Box::new(result),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShopProbe for FakeProbe {
    async fn probe(&self, _session: &Session) -> Result<(), HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.result)()
    }
}
