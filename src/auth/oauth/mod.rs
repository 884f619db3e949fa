//! OAuth collaborators of the embedded auth flow.
//!
//! The flow itself never talks to the authorization server. It goes through
//! [`OAuthProvider`], which has two halves:
//!
//! 1. **Begin** ([`OAuthProvider::begin_auth`]): build the authorization URL
//!    plus whatever cookies the provider needs to recognise the callback.
//! 2. **Validate** ([`OAuthProvider::validate_callback`]): check the callback
//!    and turn the authorization code into a [`Session`].
//!
//! Failures are reported as [`OAuthError`], a closed enum the callback
//! handler matches on exhaustively through [`OAuthError::failure`].
//!
//! [`ShopifyOAuth`] is the bundled provider: a random `state` nonce in a
//! signed cookie, HMAC validation with old-secret fallback, and the
//! code-for-token exchange over `reqwest`.
//!
//! The module also holds the bearer session-token decoder used by the
//! verifier ([`SessionTokenDecoder`], [`JwtSessionTokenDecoder`]).
//!
//! # Security
//!
//! - HMAC-SHA256 callback signatures, compared in constant time
//! - `state` round-trip through an HMAC-signed, `HttpOnly` cookie
//! - Old secrets keep in-flight flows working during a key rotation

mod auth_query;
mod error;
pub mod hmac;
mod session_token;
mod shopify;
mod state;

use async_trait::async_trait;
use cookie::Cookie;

use crate::auth::Session;
use crate::config::ShopDomain;
use crate::web::AuthRequest;

pub use auth_query::AuthQuery;
pub use error::{CallbackFailure, OAuthError};
pub use hmac::{compute_signature, constant_time_compare, validate_hmac};
pub use session_token::{JwtPayload, JwtSessionTokenDecoder, SessionTokenDecoder};
pub use shopify::{ShopifyOAuth, STATE_COOKIE};
pub use state::StateParam;

/// Where to send the merchant to approve the app, and what to remember.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
    /// The provider's authorization URL.
    pub auth_url: String,
    /// Cookies that must be set on the response carrying the redirect.
    pub cookies: Vec<Cookie<'static>>,
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthorizationRequest>();
};

/// Begins and completes the authorization code grant.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Builds the authorization redirect for a shop.
    ///
    /// `callback_path` is the app path the provider must redirect back to;
    /// `is_online` requests a user-bound token.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingHostConfig`] when no redirect URI can be
    /// built; other variants are provider specific.
    fn begin_auth(
        &self,
        shop: &ShopDomain,
        callback_path: &str,
        is_online: bool,
    ) -> Result<AuthorizationRequest, OAuthError>;

    /// Validates a callback and exchanges its code for a session.
    ///
    /// # Errors
    ///
    /// Returns an [`OAuthError`] whose [`failure`](OAuthError::failure)
    /// decides how the callback is answered.
    async fn validate_callback(
        &self,
        request: &AuthRequest,
        query: &AuthQuery,
    ) -> Result<Session, OAuthError>;
}
