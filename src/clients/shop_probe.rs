//! Live token check against the Admin API.

use async_trait::async_trait;

use crate::auth::Session;
use crate::clients::HttpError;

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Confirms with Shopify that a session's token still works.
///
/// Local checks (scopes, expiry) cannot see an uninstalled app or a revoked
/// token; the probe can. Implementations must report a rejected token as
/// [`HttpError::Response`] with code `401`.
#[async_trait]
pub trait ShopProbe: Send + Sync {
    /// Performs one authenticated request with the session's token.
    async fn probe(&self, session: &Session) -> Result<(), HttpError>;
}

/// [`ShopProbe`] that fetches `/admin/api/{version}/shop.json`.
///
/// ```rust
/// use shopify_embedded_auth::clients::RestShopProbe;
///
/// let probe = RestShopProbe::new("2025-10");
/// assert_eq!(probe.api_version(), "2025-10");
/// ```
#[derive(Clone, Debug)]
pub struct RestShopProbe {
    client: reqwest::Client,
    api_version: String,
    base_uri: Option<String>,
}

impl RestShopProbe {
    /// Creates a probe for the given Admin API version.
    #[must_use]
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_version: api_version.into(),
            base_uri: None,
        }
    }

    /// Sends probes to a fixed base URI instead of `https://{shop}`.
    ///
    /// Useful behind an egress proxy and in tests.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into().trim_end_matches('/').to_string());
        self
    }

    /// Returns the Admin API version probed.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn url_for(&self, session: &Session) -> String {
        let base = self
            .base_uri
            .clone()
            .unwrap_or_else(|| session.shop.origin());
        format!("{base}/admin/api/{}/shop.json", self.api_version)
    }
}

#[async_trait]
impl ShopProbe for RestShopProbe {
    async fn probe(&self, session: &Session) -> Result<(), HttpError> {
        let response = self
            .client
            .get(self.url_for(session))
            .header("X-Shopify-Access-Token", &session.access_token)
            .header("Accept", "application/json")
            .header(
                "User-Agent",
                format!("Shopify Embedded Auth v{SDK_VERSION} | Rust"),
            )
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        tracing::debug!(shop = %session.shop, code = status.as_u16(), "Shop probe rejected");
        Err(HttpError::Response {
            code: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShopDomain;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(token: &str) -> Session {
        Session::new(
            "offline_probe-shop.myshopify.com".to_string(),
            ShopDomain::new("probe-shop").unwrap(),
            token.to_string(),
            "read_products".parse().unwrap(),
            false,
            None,
        )
    }

    #[test]
    fn test_default_url_targets_shop() {
        let probe = RestShopProbe::new("2025-10");
        assert_eq!(
            probe.url_for(&session("t")),
            "https://probe-shop.myshopify.com/admin/api/2025-10/shop.json"
        );
    }

    #[tokio::test]
    async fn test_probe_succeeds_with_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-10/shop.json"))
            .and(header("X-Shopify-Access-Token", "good-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "shop": { "id": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let probe = RestShopProbe::new("2025-10").with_base_uri(server.uri());
        assert!(probe.probe(&session("good-token")).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_reports_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"errors":"[API] Invalid API key or access token"}"#,
            ))
            .mount(&server)
            .await;

        let probe = RestShopProbe::new("2025-10").with_base_uri(server.uri());
        let error = probe.probe(&session("revoked")).await.unwrap_err();

        assert!(error.is_unauthorized());
        assert!(error.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_probe_reports_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = RestShopProbe::new("2025-10").with_base_uri(server.uri());
        let error = probe.probe(&session("t")).await.unwrap_err();

        assert!(matches!(error, HttpError::Response { code: 503, .. }));
    }
}
