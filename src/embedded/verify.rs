//! Request verification for app routes.
//!
//! [`VerifyRequest::verify`] runs two steps in order:
//!
//! 1. [`login_again_if_different_shop`](VerifyRequest::login_again_if_different_shop):
//!    the request names another shop than the stored session, so the session
//!    is dropped and the browser goes back through auth.
//! 2. [`verify_token`](VerifyRequest::verify_token): the session must match
//!    the configured scopes, hold a token, be unexpired and pass a live probe.
//!
//! A failed check is answered according to the configured mode:
//!
//! - redirect mode: `301` to `{auth_route}?shop=..` or the fallback route
//! - header mode: `403` with the re-authorize headers, for XHR callers

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderValue, StatusCode};
use tracing::{debug, error, warn};

use crate::auth::oauth::{JwtSessionTokenDecoder, SessionTokenDecoder};
use crate::auth::{Session, SessionStore, SessionStoreError};
use crate::clients::{HttpError, RestShopProbe, ShopProbe};
use crate::config::AuthConfig;
use crate::embedded::cookies::{test_cookie, top_level_oauth_cookie};
use crate::error::AuthError;
use crate::web::{append_cookie, empty, redirect, AuthRequest, AuthResponse};

/// Set to `1` on header-mode re-auth responses.
///
/// Header names are case-insensitive; the `http` crate stores them lowercase.
pub const REAUTH_HEADER: &str = "x-shopify-api-request-failure-reauthorize";

/// Where the client should send the merchant to re-authorize.
pub const REAUTH_URL_HEADER: &str = "x-shopify-api-request-failure-reauthorize-url";

/// The result of verifying a request.
#[derive(Debug)]
pub enum VerifyOutcome {
    /// The session is valid; `response` clears the pending top-level marker
    /// and should be merged into the app's response.
    Authorized {
        /// The verified session.
        session: Session,
        /// A `200` carrying the cookie updates.
        response: AuthResponse,
    },
    /// The caller must authenticate again; send `response` as is.
    Reauthorize(AuthResponse),
}

impl VerifyOutcome {
    /// Returns `true` for [`VerifyOutcome::Authorized`].
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }

    /// Returns the verified session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authorized { session, .. } => Some(session),
            Self::Reauthorize(_) => None,
        }
    }

    /// Returns the response, dropping the session.
    #[must_use]
    pub fn into_response(self) -> AuthResponse {
        match self {
            Self::Authorized { response, .. } | Self::Reauthorize(response) => response,
        }
    }
}

/// Verifies that a request to an app route carries a usable session.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shopify_embedded_auth::embedded::VerifyOutcome;
/// use shopify_embedded_auth::VerifyRequest;
/// # use shopify_embedded_auth::{AuthConfig, AuthRequest, SessionStore};
///
/// # async fn guard(config: Arc<AuthConfig>, store: Arc<dyn SessionStore>, request: AuthRequest) {
/// let verifier = VerifyRequest::new(config, store);
///
/// match verifier.verify(&request).await {
///     Ok(VerifyOutcome::Authorized { session, .. }) => { /* serve the route */ }
///     Ok(VerifyOutcome::Reauthorize(response)) => { /* send `response` */ }
///     Err(error) => { /* 500 */ }
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct VerifyRequest {
    config: Arc<AuthConfig>,
    store: Arc<dyn SessionStore>,
    probe: Arc<dyn ShopProbe>,
    token_decoder: Arc<dyn SessionTokenDecoder>,
    probe_timeout: Option<Duration>,
}

impl std::fmt::Debug for VerifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyRequest")
            .field("config", &self.config)
            .field("probe_timeout", &self.probe_timeout)
            .finish_non_exhaustive()
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<VerifyRequest>();
};

impl VerifyRequest {
    /// Creates a verifier using [`RestShopProbe`] and
    /// [`JwtSessionTokenDecoder`].
    #[must_use]
    pub fn new(config: Arc<AuthConfig>, store: Arc<dyn SessionStore>) -> Self {
        let probe = Arc::new(RestShopProbe::new(config.api_version()));
        let token_decoder = Arc::new(JwtSessionTokenDecoder::new(Arc::clone(&config)));
        Self {
            config,
            store,
            probe,
            token_decoder,
            probe_timeout: None,
        }
    }

    /// Replaces the live session probe.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ShopProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replaces the bearer token decoder.
    #[must_use]
    pub fn with_token_decoder(mut self, decoder: Arc<dyn SessionTokenDecoder>) -> Self {
        self.token_decoder = decoder;
        self
    }

    /// Bounds the live probe. An elapsed bound is reported as
    /// [`HttpError::Timeout`] and fails verification.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Runs the shop-change guard, then the session verifier.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionStore`] if the store fails, and
    /// [`AuthError::Upstream`] if the probe fails with anything but `401`.
    pub async fn verify(&self, request: &AuthRequest) -> Result<VerifyOutcome, AuthError> {
        if let Some(response) = self.login_again_if_different_shop(request).await? {
            return Ok(VerifyOutcome::Reauthorize(response));
        }
        self.verify_token(request).await
    }

    /// Drops the session when the request names a different shop.
    ///
    /// Returns the re-auth redirect in that case and `None` otherwise. A
    /// session that is already gone at deletion time is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionStore`] if loading or deleting fails.
    pub async fn login_again_if_different_shop(
        &self,
        request: &AuthRequest,
    ) -> Result<Option<AuthResponse>, AuthError> {
        let is_online = self.config.access_mode().is_online();
        let Some(session) = self.store.load_current_session(request, is_online).await? else {
            return Ok(None);
        };
        let Some(shop) = request.query_param("shop") else {
            return Ok(None);
        };
        if session.shop.as_ref() == shop {
            return Ok(None);
        }

        debug!(from = %session.shop, to = shop, "Shop changed, clearing session");
        match self.store.delete_current_session(request, is_online).await {
            Ok(()) | Err(SessionStoreError::NotFound) => {}
            Err(error) => return Err(error.into()),
        }
        self.redirect_to_auth(request).map(Some)
    }

    /// Checks the current session and answers with the re-auth response
    /// when it is unusable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionStore`] if loading fails, and
    /// [`AuthError::Upstream`] if the probe fails with anything but `401`.
    pub async fn verify_token(&self, request: &AuthRequest) -> Result<VerifyOutcome, AuthError> {
        let is_online = self.config.access_mode().is_online();
        let session = self.store.load_current_session(request, is_online).await?;

        if let Some(current) = session.as_ref().filter(|s| self.is_usable(s)) {
            match self.probe(current).await {
                Ok(()) => {
                    let mut response = empty(StatusCode::OK);
                    append_cookie(&mut response, &top_level_oauth_cookie("", request))?;
                    return Ok(VerifyOutcome::Authorized {
                        session: current.clone(),
                        response,
                    });
                }
                Err(error) if error.is_unauthorized() => {
                    debug!(shop = %current.shop, "Access token rejected, re-authorizing");
                }
                Err(error) => {
                    error!(shop = %current.shop, %error, "Session probe failed");
                    return Err(error.into());
                }
            }
        }

        self.reauthorize(request, session.as_ref())
            .map(VerifyOutcome::Reauthorize)
    }

    fn is_usable(&self, session: &Session) -> bool {
        session.scopes == *self.config.scopes() && session.is_active()
    }

    async fn probe(&self, session: &Session) -> Result<(), HttpError> {
        match self.probe_timeout {
            Some(limit) => tokio::time::timeout(limit, self.probe.probe(session))
                .await
                .map_err(|_| HttpError::Timeout {
                    millis: limit.as_millis(),
                })?,
            None => self.probe.probe(session).await,
        }
    }

    fn reauthorize(
        &self,
        request: &AuthRequest,
        session: Option<&Session>,
    ) -> Result<AuthResponse, AuthError> {
        let mut response = if self.config.return_header() {
            self.reauthorize_header(request, session)?
        } else {
            self.redirect_to_auth(request)?
        };
        append_cookie(&mut response, &test_cookie())?;
        Ok(response)
    }

    fn reauthorize_header(
        &self,
        request: &AuthRequest,
        session: Option<&Session>,
    ) -> Result<AuthResponse, AuthError> {
        let mut response = empty(StatusCode::FORBIDDEN);
        response
            .headers_mut()
            .insert(REAUTH_HEADER, HeaderValue::from_static("1"));

        let shop = match session {
            Some(session) => Some(session.shop.to_string()),
            None if self.config.is_embedded() => self.shop_from_bearer(request),
            None => None,
        };
        if let Some(shop) = shop {
            let url = format!(
                "{}?shop={}",
                self.config.auth_route(),
                urlencoding::encode(&shop)
            );
            response
                .headers_mut()
                .insert(REAUTH_URL_HEADER, HeaderValue::from_str(&url)?);
        }
        Ok(response)
    }

    fn shop_from_bearer(&self, request: &AuthRequest) -> Option<String> {
        let token = request.bearer_token()?;
        let shop = self
            .token_decoder
            .decode_shop(token)
            .map_err(|error| warn!(%error, "Ignoring undecodable bearer token"))
            .ok()?;
        match self.config.parse_shop(&shop) {
            Ok(shop) => Some(shop.to_string()),
            Err(error) => {
                warn!(%error, "Ignoring bearer token for an invalid shop");
                None
            }
        }
    }

    fn redirect_to_auth(&self, request: &AuthRequest) -> Result<AuthResponse, AuthError> {
        let location = request.query_param("shop").map_or_else(
            || self.config.fallback_route().to_string(),
            |shop| format!("{}?shop={}", self.config.auth_route(), urlencoding::encode(shop)),
        );
        redirect(StatusCode::MOVED_PERMANENTLY, &location)
    }
}
