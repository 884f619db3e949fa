//! Cookie signals that steer the embedded flow.
//!
//! Three cookies decide where a request to the auth entry point goes:
//!
//! | cookie | set by | meaning |
//! |---|---|---|
//! | `shopifyTestCookie` | the verifier, on re-auth | first-party cookies work in this context |
//! | `shopify.granted_storage_access` | the storage-access script | the browser granted storage access |
//! | `shopifyTopLevelOAuth` | the top-level redirect | a top-level OAuth cycle is in progress |
//!
//! A cookie counts only when it is present and non-empty, so clearing one
//! means writing it back with an empty value.

use cookie::Cookie;

use crate::web::AuthRequest;

/// Marks a top-level OAuth cycle as in progress.
pub const TOP_LEVEL_OAUTH_COOKIE: &str = "shopifyTopLevelOAuth";

/// Probe for first-party cookie access.
pub const TEST_COOKIE: &str = "shopifyTestCookie";

/// Written client side once the Storage Access API grants access.
pub const GRANTED_STORAGE_ACCESS_COOKIE: &str = "shopify.granted_storage_access";

/// The cookie and query facts that routing depends on.
///
/// Recomputed for every request; never cached.
///
/// ```rust
/// use http::HeaderMap;
/// use shopify_embedded_auth::embedded::RequestSignals;
/// use shopify_embedded_auth::AuthRequest;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("cookie", "shopifyTestCookie=1; shopifyTopLevelOAuth=".parse().unwrap());
/// let request = AuthRequest::new("/auth", Some("shop=my-store.myshopify.com"), headers);
///
/// let signals = RequestSignals::from_request(&request);
/// assert!(signals.has_test_cookie);
/// assert!(!signals.has_pending_top_level_oauth);
/// assert_eq!(signals.shop.as_deref(), Some("my-store.myshopify.com"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestSignals {
    /// Raw `shop` query parameter.
    pub shop: Option<String>,
    /// Raw `host` query parameter.
    pub host: Option<String>,
    /// `shopifyTestCookie` came back.
    pub has_test_cookie: bool,
    /// `shopify.granted_storage_access` came back.
    pub has_granted_storage_access: bool,
    /// `shopifyTopLevelOAuth` came back.
    pub has_pending_top_level_oauth: bool,
}

impl RequestSignals {
    /// Reads the signals from a request.
    #[must_use]
    pub fn from_request(request: &AuthRequest) -> Self {
        let is_set = |name: &str| request.cookie(name).is_some_and(|value| !value.is_empty());
        Self {
            shop: request.query_param("shop").map(ToString::to_string),
            host: request.query_param("host").map(ToString::to_string),
            has_test_cookie: is_set(TEST_COOKIE),
            has_granted_storage_access: is_set(GRANTED_STORAGE_ACCESS_COOKIE),
            has_pending_top_level_oauth: is_set(TOP_LEVEL_OAUTH_COOKIE),
        }
    }

    /// Returns `true` if cookies set by the app can be read back.
    #[must_use]
    pub const fn has_cookie_access(&self) -> bool {
        self.has_test_cookie || self.has_granted_storage_access
    }
}

/// Returns `true` for Chrome-family user agents (`chrome` or `crios`, any case).
///
/// Such browsers get the marker cookie with the `Secure` attribute.
#[must_use]
pub fn is_chrome_family(user_agent: Option<&str>) -> bool {
    user_agent.is_some_and(|agent| {
        let agent = agent.to_ascii_lowercase();
        agent.contains("chrome") || agent.contains("crios")
    })
}

/// Builds the `shopifyTopLevelOAuth` cookie.
///
/// Pass `"1"` to mark a cycle as pending and `""` to clear it. The cookie is
/// `Secure` when the request comes from a Chrome-family browser.
#[must_use]
pub fn top_level_oauth_cookie(value: &str, request: &AuthRequest) -> Cookie<'static> {
    Cookie::build((TOP_LEVEL_OAUTH_COOKIE, value.to_string()))
        .path("/")
        .secure(is_chrome_family(request.user_agent()))
        .build()
}

/// Builds `shopifyTestCookie=1`.
#[must_use]
pub fn test_cookie() -> Cookie<'static> {
    Cookie::build((TEST_COOKIE, "1")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{COOKIE, USER_AGENT};
    use http::{HeaderMap, HeaderValue};

    fn request_with(cookies: &str, user_agent: Option<&'static str>) -> AuthRequest {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookies).unwrap());
        if let Some(agent) = user_agent {
            headers.insert(USER_AGENT, HeaderValue::from_static(agent));
        }
        AuthRequest::new("/auth", Some("shop=s.myshopify.com&host=aG9zdA"), headers)
    }

    #[test]
    fn test_signals_require_non_empty_values() {
        let signals = RequestSignals::from_request(&request_with(
            "shopifyTestCookie=; shopify.granted_storage_access=true; shopifyTopLevelOAuth=1",
            None,
        ));

        assert!(!signals.has_test_cookie);
        assert!(signals.has_granted_storage_access);
        assert!(signals.has_pending_top_level_oauth);
        assert!(signals.has_cookie_access());
        assert_eq!(signals.host.as_deref(), Some("aG9zdA"));
    }

    #[test]
    fn test_no_cookies_means_no_access() {
        let signals = RequestSignals::from_request(&request_with("other=1", None));
        assert!(!signals.has_cookie_access());
        assert!(!signals.has_pending_top_level_oauth);
    }

    #[test]
    fn test_chrome_detection_is_case_insensitive() {
        assert!(is_chrome_family(Some(
            "Mozilla/5.0 (Macintosh) AppleWebKit/537.36 Chrome/120.0 Safari/537.36"
        )));
        assert!(is_chrome_family(Some(
            "Mozilla/5.0 (iPhone) AppleWebKit/605.1.15 CriOS/120.0 Mobile/15E148"
        )));
        assert!(is_chrome_family(Some("CHROME")));
        assert!(!is_chrome_family(Some(
            "Mozilla/5.0 (Macintosh) AppleWebKit/605.1.15 Version/17.0 Safari/605.1.15"
        )));
        assert!(!is_chrome_family(None));
    }

    #[test]
    fn test_top_level_cookie_secure_only_for_chrome() {
        let chrome = request_with("", Some("Chrome/120.0"));
        let safari = request_with("", Some("Version/17.0 Safari/605.1.15"));

        let cookie = top_level_oauth_cookie("1", &chrome);
        assert_eq!(cookie.to_string(), "shopifyTopLevelOAuth=1; Secure; Path=/");

        let cookie = top_level_oauth_cookie("", &safari);
        assert_eq!(cookie.to_string(), "shopifyTopLevelOAuth=; Path=/");
    }

    #[test]
    fn test_test_cookie_value() {
        assert_eq!(test_cookie().to_string(), "shopifyTestCookie=1; Path=/");
    }
}
