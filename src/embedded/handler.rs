//! The auth route dispatcher.
//!
//! [`AuthHandler`] owns the four auth paths under the configured prefix:
//!
//! | path | handled by |
//! |---|---|
//! | `{prefix}/auth/enable_cookies` | [`AuthHandler::enable_cookies`] |
//! | `{prefix}/auth/toplevel` | [`AuthHandler::top_level_redirect`] |
//! | `{prefix}/auth` | storage access, top-level redirect or OAuth start, by cookie signals |
//! | `{prefix}/auth/callback` | [`AuthHandler::oauth_callback`] |
//!
//! Every other path passes through as `Ok(None)`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use tracing::{debug, error, info, warn};

use crate::auth::oauth::{
    AuthQuery, AuthorizationRequest, CallbackFailure, OAuthError, OAuthProvider, ShopifyOAuth,
};
use crate::auth::{Session, SessionStore};
use crate::config::{AuthConfig, ShopDomain};
use crate::embedded::cookies::{top_level_oauth_cookie, RequestSignals};
use crate::embedded::pages::{
    enable_cookies_page, redirection_page, storage_access_page, PageParams,
};
use crate::error::AuthError;
use crate::web::{append_cookie, client_error, failure, html, redirect, AuthRequest, AuthResponse};

/// The outcome of a completed OAuth callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthCallbackResult {
    /// The new session, already persisted.
    pub session: Session,
    /// The `host` query parameter of the callback, if any.
    pub host: Option<String>,
}

/// Builds the response sent once OAuth completes.
///
/// Implemented for async closures:
///
/// ```rust
/// use shopify_embedded_auth::embedded::AuthCallbackResult;
/// use shopify_embedded_auth::AuthResponse;
///
/// let hook = |result: AuthCallbackResult| async move {
///     let mut response = AuthResponse::new(String::new());
///     *response.status_mut() = http::StatusCode::FOUND;
///     response.headers_mut().insert(
///         http::header::LOCATION,
///         format!("/dashboard?shop={}", result.session.shop).parse().unwrap(),
///     );
///     response
/// };
/// # let _ = hook;
/// ```
#[async_trait]
pub trait AfterAuth: Send + Sync {
    /// Returns the response for a successful callback.
    async fn after_auth(&self, result: AuthCallbackResult) -> AuthResponse;
}

#[async_trait]
impl<F, Fut> AfterAuth for F
where
    F: Fn(AuthCallbackResult) -> Fut + Send + Sync,
    Fut: Future<Output = AuthResponse> + Send + 'static,
{
    async fn after_auth(&self, result: AuthCallbackResult) -> AuthResponse {
        self(result).await
    }
}

/// Which handler a request to an auth path is dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthRoute {
    /// The enable-cookies page.
    EnableCookies,
    /// The storage-access page: auth start without cookie access.
    RequestStorageAccess,
    /// The top-level redirect: the dedicated path, or auth start with a
    /// pending top-level cycle.
    TopLevelRedirect,
    /// The OAuth initiator: auth start with cookie access.
    BeginOAuth,
    /// The OAuth callback.
    Callback,
}

/// Serves the auth paths of an embedded app.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shopify_embedded_auth::{AuthHandler, AuthRequest};
/// # use shopify_embedded_auth::{AuthConfig, SessionStore};
///
/// # async fn serve(config: Arc<AuthConfig>, store: Arc<dyn SessionStore>, request: AuthRequest) {
/// let handler = AuthHandler::new(config, store);
///
/// match handler.handle(&request).await {
///     Ok(Some(response)) => { /* send the response */ }
///     Ok(None) => { /* not an auth path: continue to the app */ }
///     Err(error) => { /* 500 */ }
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct AuthHandler {
    config: Arc<AuthConfig>,
    store: Arc<dyn SessionStore>,
    oauth: Arc<dyn OAuthProvider>,
    after_auth: Option<Arc<dyn AfterAuth>>,
}

impl std::fmt::Debug for AuthHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHandler")
            .field("config", &self.config)
            .field("has_after_auth", &self.after_auth.is_some())
            .finish_non_exhaustive()
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthHandler>();
};

impl AuthHandler {
    /// Creates a handler using [`ShopifyOAuth`] as the OAuth provider.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>, store: Arc<dyn SessionStore>) -> Self {
        let oauth = Arc::new(ShopifyOAuth::new(Arc::clone(&config)));
        Self {
            config,
            store,
            oauth,
            after_auth: None,
        }
    }

    /// Replaces the OAuth provider.
    #[must_use]
    pub fn with_oauth_provider(mut self, oauth: Arc<dyn OAuthProvider>) -> Self {
        self.oauth = oauth;
        self
    }

    /// Sets the hook that answers successful callbacks.
    ///
    /// Without one, the callback redirects to `/?shop=..&host=..`.
    #[must_use]
    pub fn with_after_auth(mut self, hook: impl AfterAuth + 'static) -> Self {
        self.after_auth = Some(Arc::new(hook));
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Selects the handler for a request without running it.
    ///
    /// Paths are checked in priority order: enable-cookies, top-level,
    /// auth start, callback.
    #[must_use]
    pub fn route(&self, request: &AuthRequest) -> Option<AuthRoute> {
        let paths = self.config.paths();
        let path = request.path();

        if path == paths.enable_cookies {
            return Some(AuthRoute::EnableCookies);
        }
        if path == paths.top_level {
            return Some(AuthRoute::TopLevelRedirect);
        }
        if path == paths.auth {
            let signals = RequestSignals::from_request(request);
            let route = if !signals.has_cookie_access() {
                AuthRoute::RequestStorageAccess
            } else if signals.has_pending_top_level_oauth {
                AuthRoute::TopLevelRedirect
            } else {
                AuthRoute::BeginOAuth
            };
            return Some(route);
        }
        (path == paths.callback).then_some(AuthRoute::Callback)
    }

    /// Handles a request if it targets one of the auth paths.
    ///
    /// # Errors
    ///
    /// Client errors are answered with `400` responses, and callback
    /// failures with their own responses. Only unexpected failures, such as
    /// a provider that cannot build an authorization URL, are returned as
    /// `Err`.
    pub async fn handle(&self, request: &AuthRequest) -> Result<Option<AuthResponse>, AuthError> {
        let Some(route) = self.route(request) else {
            return Ok(None);
        };
        debug!(path = request.path(), ?route, shop = request.query_param("shop"), "Auth route selected");

        let response = match route {
            AuthRoute::EnableCookies => self.enable_cookies(request),
            AuthRoute::RequestStorageAccess => self.request_storage_access(request),
            AuthRoute::TopLevelRedirect => self.top_level_redirect(request)?,
            AuthRoute::BeginOAuth => self.begin_oauth(request)?,
            AuthRoute::Callback => self.oauth_callback(request).await?,
        };
        Ok(Some(response))
    }

    /// Renders the storage-access page.
    ///
    /// Missing or invalid `shop` is answered with a `400` response.
    #[must_use]
    pub fn request_storage_access(&self, request: &AuthRequest) -> AuthResponse {
        let shop = match self.require_shop(request) {
            Ok(shop) => shop,
            Err(response) => return response,
        };
        let host = request.query_param("host").unwrap_or_default();
        let paths = self.config.paths();
        let redirect_url = shop_url(&paths.auth, &shop, host);
        let denied_url = shop_url(&paths.enable_cookies, &shop, host);

        html(storage_access_page(
            &PageParams {
                api_key: self.config.api_key().as_ref(),
                host,
                shop_origin: &shop.origin(),
                redirect_url: &redirect_url,
            },
            &denied_url,
        ))
    }

    /// Renders the enable-cookies page.
    ///
    /// Missing or invalid `shop` is answered with a `400` response.
    #[must_use]
    pub fn enable_cookies(&self, request: &AuthRequest) -> AuthResponse {
        let shop = match self.require_shop(request) {
            Ok(shop) => shop,
            Err(response) => return response,
        };
        let host = request.query_param("host").unwrap_or_default();
        let redirect_url = shop_url(&self.config.paths().auth, &shop, host);

        html(enable_cookies_page(&PageParams {
            api_key: self.config.api_key().as_ref(),
            host,
            shop_origin: &shop.origin(),
            redirect_url: &redirect_url,
        }))
    }

    /// Breaks out of the iframe and starts OAuth at the top level.
    ///
    /// The page navigates straight to the provider's authorization URL, so
    /// the pending cookie it sets cannot send the browser back here.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OAuth`] if the provider cannot begin
    /// authorization. Missing or invalid `shop` is answered with a `400`.
    pub fn top_level_redirect(&self, request: &AuthRequest) -> Result<AuthResponse, AuthError> {
        let shop = match self.require_shop(request) {
            Ok(shop) => shop,
            Err(response) => return Ok(response),
        };
        let host = request.query_param("host").unwrap_or_default();
        let authorization = self.begin_auth(&shop)?;

        let mut response = html(redirection_page(&PageParams {
            api_key: self.config.api_key().as_ref(),
            host,
            shop_origin: &shop.origin(),
            redirect_url: &authorization.auth_url,
        }));
        for cookie in &authorization.cookies {
            append_cookie(&mut response, cookie)?;
        }
        append_cookie(&mut response, &top_level_oauth_cookie("1", request))?;
        Ok(response)
    }

    /// Redirects to the provider's authorization URL.
    ///
    /// Clears the pending top-level marker on the way out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OAuth`] if the provider cannot begin
    /// authorization. Missing or invalid `shop` is answered with a `400`.
    pub fn begin_oauth(&self, request: &AuthRequest) -> Result<AuthResponse, AuthError> {
        let shop = match self.require_shop(request) {
            Ok(shop) => shop,
            Err(response) => return Ok(response),
        };
        let authorization = self.begin_auth(&shop)?;

        let mut response = redirect(StatusCode::FOUND, &authorization.auth_url)?;
        for cookie in &authorization.cookies {
            append_cookie(&mut response, cookie)?;
        }
        append_cookie(&mut response, &top_level_oauth_cookie("", request))?;
        Ok(response)
    }

    /// Completes OAuth.
    ///
    /// | outcome | response |
    /// |---|---|
    /// | valid callback | session stored, after-auth hook response |
    /// | invalid callback | `400` with the error as status text |
    /// | state cookie or pre-auth session gone | `302` to `{prefix}/auth?shop=..` |
    /// | anything else | `500` with the error as status text |
    ///
    /// # Errors
    ///
    /// Only fails if the restart redirect cannot be expressed as a header.
    pub async fn oauth_callback(&self, request: &AuthRequest) -> Result<AuthResponse, AuthError> {
        let query = AuthQuery::from_request(request);

        let session = match self.oauth.validate_callback(request, &query).await {
            Ok(session) => session,
            Err(error) => return self.callback_failure(&query, &error),
        };

        if let Err(error) = self.store.store_session(&session).await {
            error!(shop = %session.shop, %error, "Failed to store session after OAuth");
            return Ok(failure(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()));
        }
        info!(shop = %session.shop, online = session.is_online, "OAuth callback completed");

        let result = AuthCallbackResult {
            session,
            host: Some(query.host).filter(|host| !host.is_empty()),
        };
        match &self.after_auth {
            Some(hook) => Ok(hook.after_auth(result).await),
            None => default_after_auth(&result),
        }
    }

    fn callback_failure(
        &self,
        query: &AuthQuery,
        error: &OAuthError,
    ) -> Result<AuthResponse, AuthError> {
        error!(shop = %query.shop, %error, "OAuth callback failed");
        match error.failure() {
            CallbackFailure::Invalid => Ok(failure(StatusCode::BAD_REQUEST, error.to_string())),
            CallbackFailure::SessionExpired => {
                let location = format!(
                    "{}?shop={}",
                    self.config.paths().auth,
                    urlencoding::encode(&query.shop)
                );
                redirect(StatusCode::FOUND, &location)
            }
            CallbackFailure::Fatal => Ok(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                error.to_string(),
            )),
        }
    }

    fn begin_auth(&self, shop: &ShopDomain) -> Result<AuthorizationRequest, AuthError> {
        let is_online = self.config.access_mode().is_online();
        self.oauth
            .begin_auth(shop, &self.config.paths().callback, is_online)
            .map_err(|error| {
                error!(%shop, %error, "Failed to begin OAuth");
                AuthError::from(error)
            })
    }

    /// Parses the `shop` parameter, or renders the `400` that answers it.
    fn require_shop(&self, request: &AuthRequest) -> Result<ShopDomain, AuthResponse> {
        let raw = request
            .query_param("shop")
            .ok_or_else(|| client_error(&AuthError::MissingShopParameter))?;
        self.config.parse_shop(raw).map_err(|source| {
            warn!(shop = raw, "Rejected invalid shop parameter");
            client_error(&AuthError::InvalidShopParameter(source))
        })
    }
}

/// `{path}?shop=..&host=..`, the query every auth page carries forward.
fn shop_url(path: &str, shop: &ShopDomain, host: &str) -> String {
    format!(
        "{path}?shop={}&host={}",
        urlencoding::encode(shop.as_ref()),
        urlencoding::encode(host)
    )
}

fn default_after_auth(result: &AuthCallbackResult) -> Result<AuthResponse, AuthError> {
    let mut location = format!("/?shop={}", urlencoding::encode(result.session.shop.as_ref()));
    if let Some(host) = &result.host {
        location.push_str("&host=");
        location.push_str(&urlencoding::encode(host));
    }
    redirect(StatusCode::FOUND, &location)
}
