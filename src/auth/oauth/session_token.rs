//! App Bridge session tokens.
//!
//! Embedded apps send `Authorization: Bearer <jwt>` on XHR requests. When a
//! request has no stored session, the verifier still needs to know which
//! shop to send back through OAuth, and the token's `dest` claim says so.
//!
//! Tokens are HS256 JWTs signed with the app's secret. Decoding tries the
//! primary secret and then the old one, allows 10 seconds of clock skew and
//! requires `aud` to equal the API key.

use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::auth::oauth::OAuthError;
use crate::config::AuthConfig;

const JWT_LEEWAY_SECS: u64 = 10;

/// Claims of a Shopify session token.
///
/// Only the claims the auth flow reads are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwtPayload {
    /// Issuer, e.g. `https://shop.myshopify.com/admin`.
    pub iss: String,
    /// Destination shop, e.g. `https://shop.myshopify.com`.
    pub dest: String,
    /// Audience; must be the app's API key.
    pub aud: String,
    /// Admin user id for online tokens.
    pub sub: Option<String>,
    /// Expiration (Unix seconds).
    pub exp: i64,
    /// Not before (Unix seconds).
    pub nbf: i64,
}

impl JwtPayload {
    /// Decodes and validates a session token.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] if the signature matches neither
    /// secret, the token is outside its validity window, or `aud` is not the
    /// configured API key.
    pub fn decode(token: &str, config: &AuthConfig) -> Result<Self, OAuthError> {
        let payload = match Self::decode_with_key(token, config.api_secret_key().as_ref()) {
            Ok(payload) => payload,
            Err(primary_err) => config
                .old_api_secret_key()
                .and_then(|old| Self::decode_with_key(token, old.as_ref()).ok())
                .ok_or_else(|| OAuthError::InvalidJwt {
                    reason: format!("Error decoding session token: {primary_err}"),
                })?,
        };

        if payload.aud != config.api_key().as_ref() {
            return Err(OAuthError::InvalidJwt {
                reason: "Session token had invalid API key".to_string(),
            });
        }

        Ok(payload)
    }

    fn decode_with_key(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = JWT_LEEWAY_SECS;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        let key = DecodingKey::from_secret(secret.as_bytes());
        decode::<Self>(token, &key, &validation).map(|data| data.claims)
    }

    /// Returns the shop host from the `dest` claim.
    #[must_use]
    pub fn shop(&self) -> &str {
        self.dest
            .strip_prefix("https://")
            .unwrap_or(self.dest.as_str())
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<JwtPayload>();
};

/// Extracts the shop from a bearer session token.
///
/// Used by the verifier in header mode to point the re-auth URL at the
/// right shop when no session was found.
pub trait SessionTokenDecoder: Send + Sync {
    /// Returns the shop the token was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] when the token cannot be trusted.
    fn decode_shop(&self, token: &str) -> Result<String, OAuthError>;
}

/// [`SessionTokenDecoder`] backed by [`JwtPayload::decode`].
#[derive(Clone, Debug)]
pub struct JwtSessionTokenDecoder {
    config: Arc<AuthConfig>,
}

impl JwtSessionTokenDecoder {
    /// Creates a decoder that validates against the config's secrets.
    #[must_use]
    pub const fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }
}

impl SessionTokenDecoder for JwtSessionTokenDecoder {
    fn decode_shop(&self, token: &str) -> Result<String, OAuthError> {
        JwtPayload::decode(token, &self.config).map(|payload| payload.shop().to_string())
    }
}
