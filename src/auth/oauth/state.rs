//! OAuth `state` nonce.
//!
//! The nonce travels twice: once in the authorization URL and once in a
//! signed cookie. The callback is only accepted when both come back equal.
//!
//! ```rust
//! use shopify_embedded_auth::auth::oauth::StateParam;
//!
//! let state = StateParam::new();
//! assert_eq!(state.nonce().len(), 15);
//! assert!(state.nonce().chars().all(|c| c.is_ascii_alphanumeric()));
//! ```

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// A random alphanumeric OAuth state value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam(String);

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    const NONCE_LENGTH: usize = 15;

    /// Generates a new nonce from the thread-local CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();
        Self(nonce)
    }

    /// Returns the nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.0
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
