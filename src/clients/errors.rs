//! HTTP error types for upstream calls.

use thiserror::Error;

/// Errors from calls to the Shopify Admin API.
///
/// ```rust
/// use shopify_embedded_auth::clients::HttpError;
///
/// let error = HttpError::Response { code: 401, message: "Invalid API key or access token".into() };
/// assert!(error.is_unauthorized());
/// ```
#[derive(Debug, Error)]
pub enum HttpError {
    /// The API answered with a non-2xx status.
    #[error("Request failed with status {code}: {message}")]
    Response {
        /// The HTTP status code of the response.
        code: u16,
        /// The response body, or a description of it.
        message: String,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request did not finish within the configured bound.
    #[error("Request timed out after {millis}ms")]
    Timeout {
        /// The bound that elapsed, in milliseconds.
        millis: u128,
    },
}

impl HttpError {
    /// Returns `true` when the API rejected the access token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Response { code: 401, .. })
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpError>();
};
