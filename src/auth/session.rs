//! Authenticated shop sessions.
//!
//! The crate never persists sessions itself; it reads and deletes them
//! through [`SessionStore`](crate::auth::SessionStore) and checks them
//! against the configuration.

use crate::auth::AuthScopes;
use crate::config::ShopDomain;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session for one shop install.
///
/// ```rust
/// use shopify_embedded_auth::{Session, ShopDomain};
///
/// let shop = ShopDomain::new("my-store").unwrap();
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "access-token".to_string(),
///     "read_products".parse().unwrap(),
///     false,
///     None,
/// );
///
/// assert_eq!(session.id, "offline_my-store.myshopify.com");
/// assert!(session.is_active());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    pub id: String,

    /// The shop this session is for.
    pub shop: ShopDomain,

    /// The access token for API authentication.
    pub access_token: String,

    /// The OAuth scopes granted to this session.
    pub scopes: AuthScopes,

    /// Whether this is an online (user-bound) session.
    pub is_online: bool,

    /// When this session expires; `None` for non-expiring tokens.
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a new session.
    #[must_use]
    pub const fn new(
        id: String,
        shop: ShopDomain,
        access_token: String,
        scopes: AuthScopes,
        is_online: bool,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            shop,
            access_token,
            scopes,
            is_online,
            expires,
        }
    }

    /// The conventional id of a shop's offline session.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{shop}")
    }

    /// The conventional id of a user's online session.
    #[must_use]
    pub fn online_id(shop: &ShopDomain, user_id: u64) -> String {
        format!("{shop}_{user_id}")
    }

    /// Builds a session from a token exchange response.
    ///
    /// `expires_in` is relative to now; online tokens always carry it.
    #[must_use]
    pub fn from_access_token_response(shop: ShopDomain, response: &AccessTokenResponse) -> Self {
        let expires = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        let (id, is_online) = match &response.associated_user {
            Some(user) => (Self::online_id(&shop, user.id), true),
            None => (Self::offline_id(&shop), false),
        };

        Self {
            id,
            access_token: response.access_token.clone(),
            scopes: response.scope.parse().unwrap_or_default(),
            shop,
            is_online,
            expires,
        }
    }

    /// Returns `true` if this session has expired.
    ///
    /// Sessions without an expiry never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if the session has a token and has not expired.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty() && !self.expired()
    }
}

/// Body of Shopify's `/admin/oauth/access_token` response.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessTokenResponse {
    /// The issued access token.
    pub access_token: String,
    /// Comma-separated granted scopes.
    pub scope: String,
    /// Lifetime in seconds, present for online tokens.
    pub expires_in: Option<u32>,
    /// The admin user, present for online tokens.
    pub associated_user: Option<AssociatedUserId>,
}

/// The part of the associated user payload this crate needs.
#[derive(Clone, Debug, Deserialize)]
pub struct AssociatedUserId {
    /// Shopify user id.
    pub id: u64,
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring(expires: Option<DateTime<Utc>>, token: &str) -> Session {
        Session::new(
            "id".to_string(),
            ShopDomain::new("shop").unwrap(),
            token.to_string(),
            AuthScopes::new(),
            true,
            expires,
        )
    }

    #[test]
    fn test_session_expired() {
        assert!(session_expiring(Some(Utc::now() - Duration::hours(1)), "t").expired());
        assert!(!session_expiring(Some(Utc::now() + Duration::hours(1)), "t").expired());
        assert!(!session_expiring(None, "t").expired());
    }

    #[test]
    fn test_session_is_active_requires_token() {
        assert!(session_expiring(None, "token").is_active());
        assert!(!session_expiring(None, "").is_active());
    }

    #[test]
    fn test_from_online_token_response() {
        let response: AccessTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "online-token",
            "scope": "write_products",
            "expires_in": 86399,
            "associated_user": { "id": 902541635 }
        }))
        .unwrap();
        let shop = ShopDomain::new("test-shop").unwrap();

        let session = Session::from_access_token_response(shop, &response);

        assert_eq!(session.id, "test-shop.myshopify.com_902541635");
        assert!(session.is_online);
        assert!(session.expires.is_some());
        assert!(session.scopes.iter().any(|s| s == "read_products"));
    }

    #[test]
    fn test_from_offline_token_response() {
        let response: AccessTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "offline-token",
            "scope": "read_products"
        }))
        .unwrap();
        let shop = ShopDomain::new("test-shop").unwrap();

        let session = Session::from_access_token_response(shop, &response);

        assert_eq!(session.id, "offline_test-shop.myshopify.com");
        assert!(!session.is_online);
        assert!(session.expires.is_none());
    }
}
