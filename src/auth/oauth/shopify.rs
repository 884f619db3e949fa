//! The bundled authorization-code provider.
//!
//! [`ShopifyOAuth`] keeps no server-side state: the `state` nonce is carried
//! in a short-lived HMAC-signed cookie, so any instance behind a load
//! balancer can finish a flow another one started.

use std::sync::Arc;

use async_trait::async_trait;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use crate::auth::oauth::hmac::{
    constant_time_compare, sign_cookie_value, validate_hmac, verify_cookie_value,
};
use crate::auth::oauth::{
    AuthQuery, AuthorizationRequest, OAuthError, OAuthProvider, StateParam,
};
use crate::auth::session::AccessTokenResponse;
use crate::auth::Session;
use crate::config::{AuthConfig, ShopDomain};
use crate::web::AuthRequest;

/// Name of the signed cookie holding the OAuth `state` nonce.
pub const STATE_COOKIE: &str = "shopify_app_state";

const STATE_COOKIE_MAX_AGE_SECS: i64 = 60;

#[derive(serde::Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// [`OAuthProvider`] implementing Shopify's authorization code grant.
///
/// ```rust
/// use std::sync::Arc;
/// use shopify_embedded_auth::auth::oauth::{OAuthProvider, ShopifyOAuth};
/// use shopify_embedded_auth::{ApiKey, ApiSecretKey, AuthConfig, HostUrl, ShopDomain};
///
/// let config = AuthConfig::builder()
///     .api_key(ApiKey::new("my-api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
///     .host(HostUrl::new("https://myapp.example.com").unwrap())
///     .scopes("read_products".parse().unwrap())
///     .build()
///     .unwrap();
///
/// let provider = ShopifyOAuth::new(Arc::new(config));
/// let shop = ShopDomain::new("my-store").unwrap();
/// let request = provider.begin_auth(&shop, "/auth/callback", false).unwrap();
///
/// assert!(request.auth_url.starts_with("https://my-store.myshopify.com/admin/oauth/authorize?"));
/// assert_eq!(request.cookies[0].name(), "shopify_app_state");
/// ```
#[derive(Clone, Debug)]
pub struct ShopifyOAuth {
    config: Arc<AuthConfig>,
    client: reqwest::Client,
    base_uri: Option<String>,
}

impl ShopifyOAuth {
    /// Creates a provider for the given configuration.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            base_uri: None,
        }
    }

    /// Sends token exchanges to a fixed base URI instead of `https://{shop}`.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into().trim_end_matches('/').to_string());
        self
    }

    /// The cookie is set on responses rendered inside the admin iframe, so it
    /// has to be `SameSite=None` to be stored at all.
    fn state_cookie(&self, state: &StateParam) -> Cookie<'static> {
        Cookie::build((STATE_COOKIE, sign_cookie_value(state.nonce(), &self.config)))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .max_age(Duration::seconds(STATE_COOKIE_MAX_AGE_SECS))
            .build()
    }

    fn expected_state<'r>(&self, request: &'r AuthRequest) -> Result<&'r str, OAuthError> {
        let signed = request
            .cookie(STATE_COOKIE)
            .ok_or_else(|| OAuthError::CookieNotFound {
                name: STATE_COOKIE.to_string(),
            })?;
        verify_cookie_value(signed, &self.config).ok_or_else(|| OAuthError::InvalidCallback {
            reason: "OAuth state cookie has an invalid signature".to_string(),
        })
    }

    async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let base = self.base_uri.clone().unwrap_or_else(|| shop.origin());
        let request_body = TokenExchangeRequest {
            client_id: self.config.api_key().as_ref(),
            client_secret: self.config.api_secret_key().as_ref(),
            code,
        };

        let response = self
            .client
            .post(format!("{base}/admin/oauth/access_token"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed {
                status: 0,
                message: format!("Network error: {e}"),
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchangeFailed {
                status,
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed {
                status,
                message: format!("Failed to parse token response: {e}"),
            })
    }
}

#[async_trait]
impl OAuthProvider for ShopifyOAuth {
    fn begin_auth(
        &self,
        shop: &ShopDomain,
        callback_path: &str,
        is_online: bool,
    ) -> Result<AuthorizationRequest, OAuthError> {
        let host = self.config.host().ok_or(OAuthError::MissingHostConfig)?;
        let state = StateParam::new();

        let mut params = vec![
            ("client_id", self.config.api_key().as_ref().to_string()),
            ("scope", self.config.scopes().to_string()),
            ("redirect_uri", format!("{}{callback_path}", host.as_ref())),
            ("state", state.to_string()),
        ];
        if is_online {
            params.push(("grant_options[]", "per-user".to_string()));
        }

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(AuthorizationRequest {
            auth_url: format!("{}/admin/oauth/authorize?{query_string}", shop.origin()),
            cookies: vec![self.state_cookie(&state)],
        })
    }

    async fn validate_callback(
        &self,
        request: &AuthRequest,
        query: &AuthQuery,
    ) -> Result<Session, OAuthError> {
        let expected_state = self.expected_state(request)?;

        if !validate_hmac(query, &self.config) {
            return Err(OAuthError::InvalidHmac);
        }

        if !constant_time_compare(&query.state, expected_state) {
            return Err(OAuthError::StateMismatch {
                expected: expected_state.to_string(),
                received: query.state.clone(),
            });
        }

        let shop = self
            .config
            .parse_shop(&query.shop)
            .map_err(|_| OAuthError::InvalidCallback {
                reason: format!("Invalid shop domain: {}", query.shop),
            })?;

        if query.code.is_empty() {
            return Err(OAuthError::InvalidCallback {
                reason: "Missing authorization code".to_string(),
            });
        }

        let token_response = self.exchange_code(&shop, &query.code).await?;
        Ok(Session::from_access_token_response(shop, &token_response))
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyOAuth>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::hmac::compute_signature;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use http::header::COOKIE;
    use http::{HeaderMap, HeaderValue};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> Arc<AuthConfig> {
        Arc::new(
            AuthConfig::builder()
                .api_key(ApiKey::new("test-api-key").unwrap())
                .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
                .host(HostUrl::new("https://myapp.example.com").unwrap())
                .scopes("read_products,write_orders".parse().unwrap())
                .build()
                .unwrap(),
        )
    }

    fn signed_query(state: &str) -> AuthQuery {
        let mut query = AuthQuery::new(
            "auth-code-123".to_string(),
            "test-shop.myshopify.com".to_string(),
            "1700000000".to_string(),
            state.to_string(),
            "dGVzdC1ob3N0".to_string(),
            String::new(),
        );
        query.hmac = compute_signature(&query.to_signable_string(), "test-secret");
        query
    }

    fn callback_request(config: &AuthConfig, state: &str) -> AuthRequest {
        let mut headers = HeaderMap::new();
        let cookie = format!("{STATE_COOKIE}={}", sign_cookie_value(state, config));
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        AuthRequest::new("/auth/callback", None, headers)
    }

    #[test]
    fn test_begin_auth_builds_authorize_url() {
        let provider = ShopifyOAuth::new(create_test_config());
        let shop = ShopDomain::new("test-shop").unwrap();

        let request = provider.begin_auth(&shop, "/auth/callback", true).unwrap();

        assert!(request
            .auth_url
            .starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
        assert!(request.auth_url.contains("client_id=test-api-key"));
        assert!(request
            .auth_url
            .contains("redirect_uri=https%3A%2F%2Fmyapp.example.com%2Fauth%2Fcallback"));
        assert!(request.auth_url.contains("grant_options%5B%5D=per-user"));
    }

    #[test]
    fn test_begin_auth_offline_has_no_grant_options() {
        let provider = ShopifyOAuth::new(create_test_config());
        let shop = ShopDomain::new("test-shop").unwrap();

        let request = provider.begin_auth(&shop, "/auth/callback", false).unwrap();
        assert!(!request.auth_url.contains("grant_options"));
    }

    #[test]
    fn test_begin_auth_state_cookie_matches_url_state() {
        let config = create_test_config();
        let provider = ShopifyOAuth::new(Arc::clone(&config));
        let shop = ShopDomain::new("test-shop").unwrap();

        let request = provider.begin_auth(&shop, "/auth/callback", false).unwrap();
        let cookie = &request.cookies[0];
        let nonce = verify_cookie_value(cookie.value(), &config).unwrap();

        assert!(request.auth_url.contains(&format!("state={nonce}")));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_begin_auth_requires_host() {
        let config = AuthConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .build()
            .unwrap();
        let provider = ShopifyOAuth::new(Arc::new(config));
        let shop = ShopDomain::new("test-shop").unwrap();

        let result = provider.begin_auth(&shop, "/auth/callback", false);
        assert!(matches!(result, Err(OAuthError::MissingHostConfig)));
    }

    #[tokio::test]
    async fn test_validate_callback_without_cookie() {
        let provider = ShopifyOAuth::new(create_test_config());
        let request = AuthRequest::new("/auth/callback", None, HeaderMap::new());

        let result = provider
            .validate_callback(&request, &signed_query("nonce"))
            .await;
        assert!(matches!(result, Err(OAuthError::CookieNotFound { .. })));
    }

    #[tokio::test]
    async fn test_validate_callback_rejects_bad_hmac() {
        let config = create_test_config();
        let provider = ShopifyOAuth::new(Arc::clone(&config));
        let mut query = signed_query("nonce");
        query.hmac = "forged".to_string();

        let result = provider
            .validate_callback(&callback_request(&config, "nonce"), &query)
            .await;
        assert!(matches!(result, Err(OAuthError::InvalidHmac)));
    }

    #[tokio::test]
    async fn test_validate_callback_rejects_state_mismatch() {
        let config = create_test_config();
        let provider = ShopifyOAuth::new(Arc::clone(&config));

        let result = provider
            .validate_callback(&callback_request(&config, "expected"), &signed_query("other"))
            .await;
        match result {
            Err(OAuthError::StateMismatch { expected, received }) => {
                assert_eq!(expected, "expected");
                assert_eq!(received, "other");
            }
            other => panic!("Expected StateMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validate_callback_exchanges_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(body_json(serde_json::json!({
                "client_id": "test-api-key",
                "client_secret": "test-secret",
                "code": "auth-code-123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "shpat_token",
                "scope": "read_products,write_orders"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = create_test_config();
        let provider = ShopifyOAuth::new(Arc::clone(&config)).with_base_uri(server.uri());

        let session = provider
            .validate_callback(&callback_request(&config, "nonce"), &signed_query("nonce"))
            .await
            .unwrap();

        assert_eq!(session.id, "offline_test-shop.myshopify.com");
        assert_eq!(session.access_token, "shpat_token");
        assert_eq!(session.scopes, *config.scopes());
    }

    #[tokio::test]
    async fn test_validate_callback_reports_exchange_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_request"))
            .mount(&server)
            .await;

        let config = create_test_config();
        let provider = ShopifyOAuth::new(Arc::clone(&config)).with_base_uri(server.uri());

        let result = provider
            .validate_callback(&callback_request(&config, "nonce"), &signed_query("nonce"))
            .await;
        match result {
            Err(OAuthError::TokenExchangeFailed { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid_request");
            }
            other => panic!("Expected TokenExchangeFailed, got {other:?}"),
        }
    }
}
