//! Framework-neutral view of an inbound request.

use std::collections::HashMap;

use http::header::{AUTHORIZATION, COOKIE, USER_AGENT};
use http::HeaderMap;
use url::form_urlencoded;

/// The parts of an HTTP request the auth flow looks at.
///
/// Build one from whatever your framework hands you:
///
/// ```rust
/// use shopify_embedded_auth::AuthRequest;
///
/// let request = http::Request::builder()
///     .uri("https://myapp.example.com/auth?shop=my-store.myshopify.com&host=abc")
///     .header("cookie", "shopifyTestCookie=1")
///     .body(())
///     .unwrap();
///
/// let request = AuthRequest::from(&request);
/// assert_eq!(request.path(), "/auth");
/// assert_eq!(request.query_param("shop"), Some("my-store.myshopify.com"));
/// assert_eq!(request.cookie("shopifyTestCookie"), Some("1"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AuthRequest {
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
}

impl AuthRequest {
    /// Builds a request view from a path, a raw query string and headers.
    #[must_use]
    pub fn new(path: impl Into<String>, raw_query: Option<&str>, headers: HeaderMap) -> Self {
        let cookies = parse_cookies(&headers);
        Self {
            path: path.into(),
            query: raw_query.map(parse_query).unwrap_or_default(),
            headers,
            cookies,
        }
    }

    /// Builds a request view from `http` request parts.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self::new(parts.uri.path(), parts.uri.query(), parts.headers.clone())
    }

    /// The request path, without query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a decoded query parameter. The first occurrence wins.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a cookie value sent with the request.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Returns the `User-Agent` header, if it is valid text.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header_str(USER_AGENT)
    }

    /// Returns the bearer token from the `Authorization` header.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header_str(AUTHORIZATION)?
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    fn header_str(&self, name: http::header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl<B> From<&http::Request<B>> for AuthRequest {
    fn from(request: &http::Request<B>) -> Self {
        Self::new(
            request.uri().path(),
            request.uri().query(),
            request.headers().clone(),
        )
    }
}

/// Decodes an `application/x-www-form-urlencoded` query. The first
/// occurrence of a key wins.
fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| cookie::Cookie::split_parse(value))
        .filter_map(Result::ok)
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_query_is_percent_and_plus_decoded() {
        let request = AuthRequest::new("/auth", Some("shop=a%2Eb&host=x+y&empty"), HeaderMap::new());
        assert_eq!(request.query_param("shop"), Some("a.b"));
        assert_eq!(request.query_param("host"), Some("x y"));
        assert_eq!(request.query_param("empty"), Some(""));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn test_first_query_value_wins() {
        let request = AuthRequest::new("/", Some("shop=one&shop=two"), HeaderMap::new());
        assert_eq!(request.query_param("shop"), Some("one"));
    }

    #[test]
    fn test_cookies_across_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers.append(COOKIE, HeaderValue::from_static("shopify.granted_storage_access=true"));
        let request = AuthRequest::new("/", None, headers);

        assert_eq!(request.cookie("a"), Some("1"));
        assert_eq!(request.cookie("b"), Some("2"));
        assert_eq!(request.cookie("shopify.granted_storage_access"), Some("true"));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(AuthRequest::new("/", None, headers).bearer_token(), Some("abc.def.ghi"));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(AuthRequest::new("/", None, headers).bearer_token(), None);
    }

    #[test]
    fn test_from_parts_matches_from_request() {
        let (parts, ()) = http::Request::builder()
            .uri("https://myapp.example.com/auth/callback?shop=a.myshopify.com&code=x%20y")
            .header(COOKIE, "shopify_app_state=abc")
            .body(())
            .unwrap()
            .into_parts();
        let request = AuthRequest::from_parts(&parts);

        assert_eq!(request.path(), "/auth/callback");
        assert_eq!(request.query_param("code"), Some("x y"));
        assert_eq!(request.cookie("shopify_app_state"), Some("abc"));
    }
}
