//! Validated newtype wrappers for configuration values.
//!
//! Each type checks its contents on construction, so a value that exists is
//! a value that is safe to interpolate into URLs, headers and scripts.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default domain suffix for Shopify shops.
pub const DEFAULT_MYSHOPIFY_DOMAIN: &str = "myshopify.com";

/// A validated Shopify API key.
///
/// The key is public: it is embedded in the interstitial pages so App Bridge
/// can identify the app.
///
/// # Example
///
/// ```rust
/// use shopify_embedded_auth::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify API secret key.
///
/// `Debug` output is masked so the secret never lands in logs.
///
/// ```rust
/// use shopify_embedded_auth::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated shop domain such as `my-store.myshopify.com`.
///
/// Short names (`my-store`) are normalized by appending the myshopify
/// suffix. Domains with any other suffix are rejected, which keeps the
/// authorization redirect pinned to Shopify.
///
/// ```rust
/// use shopify_embedded_auth::ShopDomain;
///
/// let domain = ShopDomain::new("My-Store").unwrap();
/// assert_eq!(domain.as_ref(), "my-store.myshopify.com");
/// assert_eq!(domain.shop_name(), "my-store");
///
/// assert!(ShopDomain::new("evil.example.com").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShopDomain {
    full_domain: String,
    shop_name_end: usize,
}

impl ShopDomain {
    /// Creates a shop domain using the default `myshopify.com` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is invalid.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_suffix(domain, DEFAULT_MYSHOPIFY_DOMAIN)
    }

    /// Creates a shop domain validated against a custom suffix.
    ///
    /// Used for development stores served from a non-default domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is invalid.
    pub fn with_suffix(domain: impl Into<String>, suffix: &str) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_lowercase();
        let invalid = |domain: String| ConfigError::InvalidShopDomain {
            domain,
            suffix: suffix.to_string(),
        };

        let dotted_suffix = format!(".{suffix}");
        let stripped_len = domain.strip_suffix(dotted_suffix.as_str()).map(str::len);
        let (shop_name_end, full_domain) = match stripped_len {
            Some(len) => (len, domain),
            None if domain.contains('.') => return Err(invalid(domain)),
            None => (domain.len(), format!("{domain}{dotted_suffix}")),
        };

        if !Self::is_valid_shop_name(&full_domain[..shop_name_end]) {
            return Err(invalid(full_domain));
        }

        Ok(Self {
            full_domain,
            shop_name_end,
        })
    }

    /// Returns the shop name portion of the domain.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.full_domain[..self.shop_name_end]
    }

    /// Returns the shop's admin origin, e.g. `https://my-store.myshopify.com`.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("https://{}", self.full_domain)
    }

    fn is_valid_shop_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('-')
            && !name.ends_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.full_domain
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_domain)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.full_domain)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A validated public URL of the app, e.g. `https://myapp.example.com`.
///
/// Used to build the OAuth `redirect_uri`. Trailing slashes are dropped so
/// paths can be appended directly.
///
/// ```rust
/// use shopify_embedded_auth::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.com/").unwrap();
/// assert_eq!(url.as_ref(), "https://myapp.example.com");
/// assert_eq!(url.host_name(), "myapp.example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    host_start: usize,
    host_end: usize,
}

impl HostUrl {
    /// Creates a new validated host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL has no scheme or host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        let invalid = || ConfigError::InvalidHostUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        let host_end = url[host_start..]
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);
        if host_end <= host_start {
            return Err(invalid());
        }

        Ok(Self {
            url,
            host_start,
            host_end,
        })
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
