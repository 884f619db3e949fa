//! Session store seam.
//!
//! Persistence belongs to the application. The flow only needs to find the
//! session that belongs to the current request, remove it when the shop
//! changes, and hand over a fresh one after OAuth completes.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Session;
use crate::web::AuthRequest;

/// Errors reported by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// No session matched the request.
    ///
    /// Deleting a session that is already gone reports this; the shop-change
    /// guard treats it as a no-op.
    #[error("Session not found")]
    NotFound,

    /// The backing storage failed.
    #[error("Session storage failed: {0}")]
    Backend(String),
}

/// Storage for authenticated sessions.
///
/// `is_online` selects between the user's online session and the shop's
/// offline session; implementations decide how the request maps to an id
/// (a signed cookie, the bearer token's `sid`, the `shop` parameter...).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session for the current request, if any.
    async fn load_current_session(
        &self,
        request: &AuthRequest,
        is_online: bool,
    ) -> Result<Option<Session>, SessionStoreError>;

    /// Deletes the session for the current request.
    ///
    /// Returns [`SessionStoreError::NotFound`] when there was nothing to delete.
    async fn delete_current_session(
        &self,
        request: &AuthRequest,
        is_online: bool,
    ) -> Result<(), SessionStoreError>;

    /// Persists a session created by a completed OAuth callback.
    async fn store_session(&self, session: &Session) -> Result<(), SessionStoreError>;
}
