//! OAuth scope sets.
//!
//! Request verification compares a session's granted scopes with the
//! configured ones; any difference forces the merchant through OAuth again
//! so newly requested permissions get approved.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth scopes with implied scopes expanded.
///
/// `write_x` implies `read_x`, and `unauthenticated_write_x` implies
/// `unauthenticated_read_x`. Expansion happens on construction, so two sets
/// built from `"write_products"` and `"read_products,write_products"` are
/// equal.
///
/// ```rust
/// use shopify_embedded_auth::AuthScopes;
///
/// let configured: AuthScopes = "write_products".parse().unwrap();
/// let granted: AuthScopes = "read_products, write_products".parse().unwrap();
/// assert_eq!(configured, granted);
/// assert_eq!(granted.to_string(), "read_products,write_products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Iterates over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn from_set(mut scopes: BTreeSet<String>) -> Self {
        let implied: Vec<String> = scopes.iter().filter_map(|s| implied_scope(s)).collect();
        scopes.extend(implied);
        Self { scopes }
    }
}

fn implied_scope(scope: &str) -> Option<String> {
    if let Some(rest) = scope.strip_prefix("unauthenticated_write_") {
        return Some(format!("unauthenticated_read_{rest}"));
    }
    scope
        .strip_prefix("write_")
        .map(|rest| format!("read_{rest}"))
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();
        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }
            scopes.insert(scope.to_string());
        }
        Ok(Self::from_set(scopes))
    }
}

impl From<Vec<String>> for AuthScopes {
    fn from(scopes: Vec<String>) -> Self {
        Self::from_set(
            scopes
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_scopes_expands_implied_scopes() {
        let scopes: AuthScopes = "write_orders,unauthenticated_write_checkouts"
            .parse()
            .unwrap();
        assert!(scopes.iter().any(|s| s == "read_orders"));
        assert!(scopes
            .iter()
            .any(|s| s == "unauthenticated_read_checkouts"));
    }

    #[test]
    fn test_equality_ignores_order_and_whitespace() {
        let a: AuthScopes = "read_products, write_orders".parse().unwrap();
        let b: AuthScopes = "write_orders,read_products,read_orders".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_added_scope_breaks_equality() {
        let granted: AuthScopes = "read_products".parse().unwrap();
        let configured: AuthScopes = "read_products,read_customers".parse().unwrap();
        assert_ne!(granted, configured);
    }

    #[test]
    fn test_rejects_invalid_characters() {
        let result = "read products".parse::<AuthScopes>();
        assert!(matches!(result, Err(ConfigError::InvalidScopes { .. })));
    }

    #[test]
    fn test_from_vec_skips_blank_entries() {
        let scopes = AuthScopes::from(vec![" write_themes ".to_string(), String::new()]);
        assert_eq!(scopes.to_string(), "read_themes,write_themes");
    }

    #[test]
    fn test_serializes_as_comma_separated_string() {
        let scopes: AuthScopes = "write_orders".parse().unwrap();
        let json = serde_json::to_string(&scopes).unwrap();
        assert_eq!(json, r#""read_orders,write_orders""#);
        let back: AuthScopes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scopes);
    }
}
