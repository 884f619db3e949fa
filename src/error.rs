//! Error types for the embedded auth crate.
//!
//! Two families live here:
//!
//! - [`ConfigError`]: raised while building an [`AuthConfig`](crate::AuthConfig)
//!   or one of its validated newtypes. These surface once, at startup.
//! - [`AuthError`]: raised while handling a request. Client mistakes
//!   (a missing or malformed `shop` parameter) are rendered as `400` responses
//!   by the handlers; everything else propagates to the caller.
//!
//! # Example
//!
//! ```rust
//! use shopify_embedded_auth::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use http::StatusCode;
use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::auth::SessionStoreError;
use crate::clients::HttpError;

/// Errors that can occur while configuring the crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Shopify API key.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide a valid Shopify API secret key.")]
    EmptyApiSecretKey,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.{suffix}'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
        /// The myshopify suffix the domain was checked against.
        suffix: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// Access mode is not `online` or `offline`.
    #[error("Invalid access mode '{mode}'. Expected 'online' or 'offline'.")]
    InvalidAccessMode {
        /// The rejected value.
        mode: String,
    },

    /// A route or prefix is not an absolute path.
    #[error("Invalid path '{path}'. Paths must be empty or start with '/'.")]
    InvalidPath {
        /// The rejected path.
        path: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://myapp.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },
}

/// Errors raised while routing or verifying a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request has no `shop` query parameter.
    #[error("Shop param missing")]
    MissingShopParameter,

    /// The `shop` query parameter is not a valid shop domain.
    #[error("Invalid shop param")]
    InvalidShopParameter(#[source] ConfigError),

    /// The OAuth provider failed outside of callback validation.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// The session store failed.
    #[error(transparent)]
    SessionStore(#[from] SessionStoreError),

    /// The live upstream probe failed with something other than a 401.
    #[error(transparent)]
    Upstream(#[from] HttpError),

    /// A header value could not be built from request data.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

impl AuthError {
    /// Returns `true` for errors caused by the caller's input.
    ///
    /// These are answered with a `400` rather than propagated.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingShopParameter | Self::InvalidShopParameter(_)
        )
    }

    /// The status code a framework adapter should use for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthError>();
};
