//! Query parameters of the OAuth callback.

use crate::web::AuthRequest;

/// The parameters Shopify appends to the OAuth callback URL.
///
/// Missing parameters read as empty strings; validation decides what to do
/// with them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthQuery {
    /// Authorization code to exchange for a token.
    pub code: String,
    /// The shop that approved the request.
    pub shop: String,
    /// Base64 admin host, used by App Bridge.
    pub host: String,
    /// The state issued by `begin_auth`.
    pub state: String,
    /// Unix timestamp of the redirect.
    pub timestamp: String,
    /// Hex HMAC-SHA256 over the other parameters.
    pub hmac: String,
}

impl AuthQuery {
    /// Creates a query from its parts.
    #[must_use]
    pub const fn new(
        code: String,
        shop: String,
        timestamp: String,
        state: String,
        host: String,
        hmac: String,
    ) -> Self {
        Self {
            code,
            shop,
            host,
            state,
            timestamp,
            hmac,
        }
    }

    /// Reads the callback parameters from a request.
    #[must_use]
    pub fn from_request(request: &AuthRequest) -> Self {
        let param = |name: &str| request.query_param(name).unwrap_or_default().to_string();
        Self {
            code: param("code"),
            shop: param("shop"),
            host: param("host"),
            state: param("state"),
            timestamp: param("timestamp"),
            hmac: param("hmac"),
        }
    }

    /// The message Shopify signs: every non-empty parameter except `hmac`,
    /// sorted by name, joined as `key=value&...`.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = [
            ("code", self.code.as_str()),
            ("host", self.host.as_str()),
            ("shop", self.shop.as_str()),
            ("state", self.state.as_str()),
            ("timestamp", self.timestamp.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();
        pairs.sort_unstable_by_key(|(key, _)| *key);

        pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    #[test]
    fn test_from_request_reads_all_parameters() {
        let request = AuthRequest::new(
            "/auth/callback",
            Some("code=c&shop=s.myshopify.com&host=aG9zdA&state=st&timestamp=1&hmac=h"),
            HeaderMap::new(),
        );
        let query = AuthQuery::from_request(&request);

        assert_eq!(query.code, "c");
        assert_eq!(query.shop, "s.myshopify.com");
        assert_eq!(query.host, "aG9zdA");
        assert_eq!(query.hmac, "h");
    }

    #[test]
    fn test_signable_string_is_sorted_and_skips_hmac() {
        let query = AuthQuery::new(
            "code".to_string(),
            "shop.myshopify.com".to_string(),
            "1700000000".to_string(),
            "nonce".to_string(),
            String::new(),
            "ignored".to_string(),
        );

        assert_eq!(
            query.to_signable_string(),
            "code=code&shop=shop.myshopify.com&state=nonce&timestamp=1700000000"
        );
    }
}
