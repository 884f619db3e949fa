//! OAuth error types.
//!
//! [`OAuthError`] is the closed set of failures an
//! [`OAuthProvider`](crate::auth::oauth::OAuthProvider) may report. The
//! callback handler never inspects messages; it matches on
//! [`OAuthError::failure`] to decide between `400`, a restart, or `500`.
//!
//! ```rust
//! use shopify_embedded_auth::auth::oauth::{CallbackFailure, OAuthError};
//!
//! let error = OAuthError::CookieNotFound { name: "shopify_app_state".into() };
//! assert_eq!(error.failure(), CallbackFailure::SessionExpired);
//! assert_eq!(OAuthError::InvalidHmac.failure(), CallbackFailure::Invalid);
//! ```

use crate::clients::HttpError;
use thiserror::Error;

/// Errors that can occur during OAuth operations.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// HMAC signature validation failed.
    #[error("HMAC signature validation failed")]
    InvalidHmac,

    /// The callback `state` does not match the one issued by `begin_auth`.
    #[error("State parameter mismatch: expected '{expected}', received '{received}'")]
    StateMismatch {
        /// The state stored when authorization began.
        expected: String,
        /// The state received in the callback.
        received: String,
    },

    /// Callback parameters are missing or malformed.
    #[error("Invalid callback: {reason}")]
    InvalidCallback {
        /// What is wrong with the callback.
        reason: String,
    },

    /// The short-lived pre-auth cookie did not come back.
    ///
    /// Usually the merchant took longer to approve than the cookie lives,
    /// or the browser dropped it.
    #[error("Cannot complete OAuth process. Could not find an OAuth cookie '{name}'")]
    CookieNotFound {
        /// Name of the missing cookie.
        name: String,
    },

    /// The pre-auth session record referenced by the cookie is gone.
    #[error("Cannot complete OAuth process. No session found for the specified shop url")]
    SessionNotFound,

    /// Exchanging the authorization code for a token failed.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned, `0` when none was received.
        status: u16,
        /// The error message from the response.
        message: String,
    },

    /// Host URL is not configured, so no `redirect_uri` can be built.
    #[error("Host URL must be configured in AuthConfig for OAuth")]
    MissingHostConfig,

    /// A bearer session token could not be decoded or validated.
    #[error("Invalid session token: {reason}")]
    InvalidJwt {
        /// Why the token was rejected.
        reason: String,
    },

    /// Wrapped HTTP client error.
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// How the callback handler reacts to an [`OAuthError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackFailure {
    /// Malformed or forged callback: answer `400`.
    Invalid,
    /// Pre-auth state is gone: restart the flow with a `302` to auth.
    SessionExpired,
    /// Anything else: answer `500`.
    Fatal,
}

impl OAuthError {
    /// Classifies this error for the callback state machine.
    #[must_use]
    pub const fn failure(&self) -> CallbackFailure {
        match self {
            Self::InvalidHmac | Self::StateMismatch { .. } | Self::InvalidCallback { .. } => {
                CallbackFailure::Invalid
            }
            Self::CookieNotFound { .. } | Self::SessionNotFound => CallbackFailure::SessionExpired,
            Self::TokenExchangeFailed { .. }
            | Self::MissingHostConfig
            | Self::InvalidJwt { .. }
            | Self::Http(_) => CallbackFailure::Fatal,
        }
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_kinds() {
        let mismatch = OAuthError::StateMismatch {
            expected: "abc123".to_string(),
            received: "xyz789".to_string(),
        };
        assert_eq!(mismatch.failure(), CallbackFailure::Invalid);
        assert!(mismatch.to_string().contains("xyz789"));

        let malformed = OAuthError::InvalidCallback {
            reason: "Missing code".to_string(),
        };
        assert_eq!(malformed.failure(), CallbackFailure::Invalid);
    }

    #[test]
    fn test_session_expired_kinds() {
        assert_eq!(
            OAuthError::SessionNotFound.failure(),
            CallbackFailure::SessionExpired
        );
        let missing = OAuthError::CookieNotFound {
            name: "shopify_app_state".to_string(),
        };
        assert!(missing.to_string().contains("shopify_app_state"));
    }

    #[test]
    fn test_fatal_kinds() {
        let exchange = OAuthError::TokenExchangeFailed {
            status: 500,
            message: "oops".to_string(),
        };
        assert_eq!(exchange.failure(), CallbackFailure::Fatal);
        assert_eq!(OAuthError::MissingHostConfig.failure(), CallbackFailure::Fatal);

        let http: OAuthError = HttpError::Timeout { millis: 5 }.into();
        assert_eq!(http.failure(), CallbackFailure::Fatal);
    }
}
