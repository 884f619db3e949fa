//! Routing configuration for the embedded auth flow.
//!
//! [`AuthConfig`] is built once at startup and shared read-only (usually
//! behind an `Arc`) by every handler. There is no global state: cookie names
//! are constants, everything else lives on the config value.
//!
//! # Example
//!
//! ```rust
//! use shopify_embedded_auth::{AccessMode, ApiKey, ApiSecretKey, AuthConfig, HostUrl};
//!
//! let config = AuthConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://myapp.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .prefix("/shopify")
//!     .access_mode(AccessMode::Offline)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.paths().auth, "/shopify/auth");
//! assert_eq!(config.paths().callback, "/shopify/auth/callback");
//! ```

mod access_mode;
mod newtypes;

pub use access_mode::AccessMode;
pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain, DEFAULT_MYSHOPIFY_DOMAIN};

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Admin API version queried by the default live session probe.
pub const DEFAULT_API_VERSION: &str = "2025-10";

/// The request paths served by [`AuthHandler`](crate::AuthHandler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthPaths {
    /// Entry point: `{prefix}/auth`.
    pub auth: String,
    /// Dedicated top-level breakout: `{prefix}/auth/toplevel`.
    pub top_level: String,
    /// OAuth provider callback: `{prefix}/auth/callback`.
    pub callback: String,
    /// ITP enable-cookies page: `{prefix}/auth/enable_cookies`.
    pub enable_cookies: String,
}

impl AuthPaths {
    fn with_prefix(prefix: &str) -> Self {
        let auth = format!("{prefix}/auth");
        Self {
            top_level: format!("{auth}/toplevel"),
            callback: format!("{auth}/callback"),
            enable_cookies: format!("{auth}/enable_cookies"),
            auth,
        }
    }
}

/// Immutable configuration for the embedded auth flow.
///
/// `AuthConfig` is `Clone`, `Send` and `Sync`.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: Option<HostUrl>,
    is_embedded: bool,
    access_mode: AccessMode,
    prefix: String,
    paths: AuthPaths,
    auth_route: String,
    fallback_route: String,
    return_header: bool,
    my_shopify_domain: String,
    api_version: String,
}

impl AuthConfig {
    /// Creates a new builder for constructing an `AuthConfig`.
    #[must_use]
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::new()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous API secret key, accepted during key rotation.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the scopes a valid session must carry.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the public URL of the app, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.is_embedded
    }

    /// Returns the access mode used for OAuth and session lookups.
    #[must_use]
    pub const fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Returns the path prefix (empty when mounted at the root).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the auth request paths derived from the prefix.
    #[must_use]
    pub const fn paths(&self) -> &AuthPaths {
        &self.paths
    }

    /// Route that request verification sends re-authenticating shops to.
    #[must_use]
    pub fn auth_route(&self) -> &str {
        &self.auth_route
    }

    /// Route used by request verification when no shop is known.
    #[must_use]
    pub fn fallback_route(&self) -> &str {
        &self.fallback_route
    }

    /// Whether failed verification answers with reauthorize headers
    /// instead of a redirect.
    #[must_use]
    pub const fn return_header(&self) -> bool {
        self.return_header
    }

    /// Returns the domain suffix shops must belong to.
    #[must_use]
    pub fn my_shopify_domain(&self) -> &str {
        &self.my_shopify_domain
    }

    /// Returns the Admin API version used by the default probe.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Validates a raw `shop` value against the configured domain suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the shop is malformed.
    pub fn parse_shop(&self, shop: &str) -> Result<ShopDomain, ConfigError> {
        ShopDomain::with_suffix(shop, &self.my_shopify_domain)
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthConfig>();
};

/// Builder for [`AuthConfig`].
///
/// Required fields are `api_key` and `api_secret_key`.
///
/// # Defaults
///
/// - `prefix`: `""`
/// - `access_mode`: [`AccessMode::Online`]
/// - `is_embedded`: `true`
/// - `scopes`: empty
/// - `host`: `None`
/// - `auth_route` and `fallback_route`: `{prefix}/auth`
/// - `return_header`: `false`
/// - `my_shopify_domain`: `myshopify.com`
/// - `api_version`: [`DEFAULT_API_VERSION`]
#[derive(Debug, Default)]
pub struct AuthConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    is_embedded: Option<bool>,
    access_mode: Option<AccessMode>,
    prefix: Option<String>,
    auth_route: Option<String>,
    fallback_route: Option<String>,
    return_header: Option<bool>,
    my_shopify_domain: Option<String>,
    api_version: Option<String>,
}

impl AuthConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous secret key so in-flight flows survive a rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the required OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public URL of the app.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(mut self, embedded: bool) -> Self {
        self.is_embedded = Some(embedded);
        self
    }

    /// Sets the access mode.
    #[must_use]
    pub const fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = Some(mode);
        self
    }

    /// Sets the path prefix all auth routes are mounted under.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Overrides the route request verification redirects to.
    #[must_use]
    pub fn auth_route(mut self, route: impl Into<String>) -> Self {
        self.auth_route = Some(route.into());
        self
    }

    /// Overrides the route used when no shop is known.
    #[must_use]
    pub fn fallback_route(mut self, route: impl Into<String>) -> Self {
        self.fallback_route = Some(route.into());
        self
    }

    /// Answers failed verification with `403` + reauthorize headers.
    ///
    /// Meant for clients that cannot follow redirects, such as `fetch`
    /// calls from an embedded frontend.
    #[must_use]
    pub const fn return_header(mut self, enabled: bool) -> Self {
        self.return_header = Some(enabled);
        self
    }

    /// Sets the domain suffix shops must belong to.
    #[must_use]
    pub fn my_shopify_domain(mut self, domain: impl Into<String>) -> Self {
        self.my_shopify_domain = Some(domain.into());
        self
    }

    /// Sets the Admin API version used by the default probe.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Builds the [`AuthConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key` or
    /// `api_secret_key` are not set, and [`ConfigError::InvalidPath`] if the
    /// prefix or a route is not an absolute path.
    pub fn build(self) -> Result<AuthConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        let prefix = self
            .prefix
            .map(|p| p.trim_end_matches('/').to_string())
            .unwrap_or_default();
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(ConfigError::InvalidPath { path: prefix });
        }
        let paths = AuthPaths::with_prefix(&prefix);

        let auth_route = validate_route(self.auth_route.unwrap_or_else(|| paths.auth.clone()))?;
        let fallback_route =
            validate_route(self.fallback_route.unwrap_or_else(|| paths.auth.clone()))?;

        Ok(AuthConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            host: self.host,
            is_embedded: self.is_embedded.unwrap_or(true),
            access_mode: self.access_mode.unwrap_or_default(),
            prefix,
            paths,
            auth_route,
            fallback_route,
            return_header: self.return_header.unwrap_or(false),
            my_shopify_domain: self
                .my_shopify_domain
                .unwrap_or_else(|| DEFAULT_MYSHOPIFY_DOMAIN.to_string()),
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }
}

fn validate_route(route: String) -> Result<String, ConfigError> {
    if route.starts_with('/') {
        Ok(route)
    } else {
        Err(ConfigError::InvalidPath { path: route })
    }
}
