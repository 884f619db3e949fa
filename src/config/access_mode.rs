//! Online vs offline access mode.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of access token the app requests and verifies.
///
/// - `Online`: short-lived, bound to the admin user who is logged in.
/// - `Offline`: long-lived, bound to the shop.
///
/// ```rust
/// use shopify_embedded_auth::AccessMode;
///
/// let mode: AccessMode = "offline".parse().unwrap();
/// assert!(!mode.is_online());
/// assert_eq!(AccessMode::default(), AccessMode::Online);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// User-bound, expiring tokens.
    #[default]
    Online,
    /// Shop-bound, non-expiring tokens.
    Offline,
}

impl AccessMode {
    /// Returns `true` for [`AccessMode::Online`].
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl FromStr for AccessMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(ConfigError::InvalidAccessMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Online => "online",
            Self::Offline => "offline",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_parses_case_insensitively() {
        assert_eq!("ONLINE".parse::<AccessMode>().unwrap(), AccessMode::Online);
        assert_eq!(" offline ".parse::<AccessMode>().unwrap(), AccessMode::Offline);
    }

    #[test]
    fn test_access_mode_rejects_unknown() {
        let result = "per-user".parse::<AccessMode>();
        assert!(matches!(result, Err(ConfigError::InvalidAccessMode { .. })));
    }

    #[test]
    fn test_access_mode_serde_uses_lowercase() {
        let json = serde_json::to_string(&AccessMode::Offline).unwrap();
        assert_eq!(json, r#""offline""#);
        let mode: AccessMode = serde_json::from_str(r#""online""#).unwrap();
        assert!(mode.is_online());
    }
}
