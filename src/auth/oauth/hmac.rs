//! HMAC-SHA256 helpers for callback validation and signed cookies.
//!
//! All comparisons are constant-time. Validation tries the primary secret
//! first and then the old secret, so flows started before a key rotation
//! can still finish.
//!
//! ```rust
//! use shopify_embedded_auth::auth::oauth::hmac::compute_signature;
//!
//! let signature = compute_signature("message", "key");
//! assert_eq!(
//!     signature,
//!     "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
//! );
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::AuthQuery;
use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

fn mac_bytes(message: &[u8], secret: &str) -> Vec<u8> {
    // HMAC accepts keys of any length, so `new_from_slice` cannot fail here.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return Vec::new();
    };
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Computes a lowercase hex HMAC-SHA256 signature, as Shopify sends in `hmac`.
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    mac_bytes(message.as_bytes(), secret)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Computes a URL-safe, unpadded base64 HMAC-SHA256 signature.
///
/// Used for cookie values, where hex would be needlessly long.
#[must_use]
pub fn compute_signature_base64(message: &str, secret: &str) -> String {
    URL_SAFE_NO_PAD.encode(mac_bytes(message.as_bytes(), secret))
}

/// Performs constant-time comparison of two strings.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn secrets(config: &AuthConfig) -> impl Iterator<Item = &str> {
    std::iter::once(config.api_secret_key().as_ref())
        .chain(config.old_api_secret_key().map(|key| key.as_ref()))
}

/// Validates the `hmac` parameter of an OAuth callback.
#[must_use]
pub fn validate_hmac(query: &AuthQuery, config: &AuthConfig) -> bool {
    let signable = query.to_signable_string();
    secrets(config)
        .any(|secret| constant_time_compare(&compute_signature(&signable, secret), &query.hmac))
}

/// Appends a signature to a cookie value: `value.signature`.
#[must_use]
pub fn sign_cookie_value(value: &str, config: &AuthConfig) -> String {
    let signature = compute_signature_base64(value, config.api_secret_key().as_ref());
    format!("{value}.{signature}")
}

/// Returns the original value of a cookie signed by [`sign_cookie_value`].
///
/// `None` when the signature is missing or does not match any secret.
#[must_use]
pub fn verify_cookie_value<'a>(signed: &'a str, config: &AuthConfig) -> Option<&'a str> {
    let (value, signature) = signed.rsplit_once('.')?;
    secrets(config)
        .any(|secret| constant_time_compare(&compute_signature_base64(value, secret), signature))
        .then_some(value)
}
