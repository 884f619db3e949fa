//! Interstitial HTML documents.
//!
//! The pages are minimal: just enough markup for the scripts to run and for
//! the merchant to click through when the browser demands a user gesture.
//! Every interpolated value goes through [`js_string`] or [`html_attr`].

const APP_BRIDGE_SRC: &str = "https://unpkg.com/@shopify/app-bridge@2";

const STYLES: &str = r"
    body { font-family: -apple-system, BlinkMacSystemFont, 'San Francisco', 'Segoe UI', Roboto, 'Helvetica Neue', sans-serif; background: #f6f6f7; color: #202223; margin: 0; }
    main { display: none; max-width: 40rem; margin: 4rem auto; padding: 0 1rem; }
    .card { background: #fff; border-radius: 0.5rem; box-shadow: 0 0 0 1px rgba(63, 63, 68, 0.05), 0 1px 3px 0 rgba(63, 63, 68, 0.15); padding: 1.25rem; }
    .card h1 { font-size: 1.25rem; margin: 0 0 1rem; }
    .card .subdued { color: #6d7175; }
    .actions { display: flex; justify-content: flex-end; margin-top: 1rem; }
    .button { background: #008060; border: 0; border-radius: 0.25rem; color: #fff; cursor: pointer; font-size: 0.9375rem; padding: 0.5rem 1rem; text-decoration: none; }
";

/// Values interpolated into an interstitial page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageParams<'a> {
    /// The app's API key, for App Bridge.
    pub api_key: &'a str,
    /// The base64 admin host from the `host` query parameter.
    pub host: &'a str,
    /// `https://{shop}`.
    pub shop_origin: &'a str,
    /// Where the page sends the browser next.
    pub redirect_url: &'a str,
}

/// Encodes a value as a JavaScript string literal, quotes included.
///
/// `<` is escaped as well so a value can never close the `<script>` tag.
#[must_use]
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
}

/// Escapes a value for use inside a double-quoted HTML attribute.
#[must_use]
pub fn html_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn app_globals(params: &PageParams<'_>) -> String {
    format!(
        "window.apiKey = {};\n    window.host = {};\n    window.shopOrigin = {};",
        js_string(params.api_key),
        js_string(params.host),
        js_string(params.shop_origin),
    )
}

/// Asks the browser for first-party storage access from inside the iframe.
///
/// Browsers without the Storage Access API go straight to `redirect_url`.
/// Otherwise the page checks for existing access, and if there is none shows
/// a button whose click calls `document.requestStorageAccess()`. Granting
/// writes `shopify.granted_storage_access=true` and goes to `redirect_url`.
/// A denial goes to `denied_url`, which should be the enable-cookies page:
/// sending it back to auth would land on this page again.
#[must_use]
pub fn storage_access_page(params: &PageParams<'_>, denied_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <style>{STYLES}</style>
  <base target="_top">
  <title>Redirecting…</title>
  <script src="{APP_BRIDGE_SRC}"></script>
  <script>
    {globals}
    (function() {{
      var redirectUrl = {redirect_url};
      var deniedUrl = {denied_url};

      function redirect() {{
        window.location.href = redirectUrl;
      }}

      function denied() {{
        window.location.href = deniedUrl;
      }}

      function granted() {{
        document.cookie = "shopify.granted_storage_access=true; path=/; secure; samesite=none";
        redirect();
      }}

      function setUpStorageAccess() {{
        if (!document.hasStorageAccess) {{
          document.cookie = "shopifyTestCookie=1; path=/; secure; samesite=none";
          redirect();
          return;
        }}
        document.hasStorageAccess().then(function(hasAccess) {{
          if (hasAccess) {{
            granted();
            return;
          }}
          document.getElementById("RequestStorageAccess").style.display = "block";
          document.getElementById("TriggerAllowCookiesPrompt").addEventListener("click", function() {{
            document.requestStorageAccess().then(granted, denied);
          }});
        }});
      }}

      document.addEventListener("DOMContentLoaded", setUpStorageAccess);
    }})();
  </script>
</head>
<body>
  <main id="RequestStorageAccess">
    <div class="card">
      <h1>This app needs access to your browser data</h1>
      <p>Your browser is blocking this app from accessing your data. To continue using this app, click Continue, then click Allow if the browser prompts you.</p>
    </div>
    <div class="actions">
      <button type="button" class="button" id="TriggerAllowCookiesPrompt">Continue</button>
    </div>
  </main>
</body>
</html>"#,
        globals = app_globals(params),
        redirect_url = js_string(params.redirect_url),
        denied_url = js_string(denied_url),
    )
}

/// Explains how to enable cookies and offers a top-level link back to auth.
///
/// Outside an iframe, or in browsers without the Storage Access API, the
/// page forwards to `redirect_url` right away.
#[must_use]
pub fn enable_cookies_page(params: &PageParams<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <style>{STYLES}</style>
  <base target="_top">
  <title>Redirecting…</title>
  <script>
    {globals}
    (function() {{
      var redirectUrl = {redirect_url};

      function markInteraction() {{
        document.cookie = "shopifyTestCookie=1; path=/; secure; samesite=none";
      }}

      function setUpTopLevelInteraction() {{
        var embedded = window.top !== window.self;
        if (!embedded || !document.hasStorageAccess) {{
          markInteraction();
          window.location.href = redirectUrl;
          return;
        }}
        document.getElementById("TopLevelInteractionContent").style.display = "block";
        document.getElementById("TopLevelInteractionButton").addEventListener("click", markInteraction);
      }}

      document.addEventListener("DOMContentLoaded", setUpTopLevelInteraction);
    }})();
  </script>
</head>
<body>
  <main id="TopLevelInteractionContent">
    <div class="card">
      <h1>Enable cookies</h1>
      <p>You must manually enable cookies in this browser in order to use this app within Shopify.</p>
      <p class="subdued">Cookies let the app authenticate you by temporarily storing your preferences and personal information. They expire after 30 days.</p>
    </div>
    <div class="actions">
      <a class="button" id="TopLevelInteractionButton" href="{href}" target="_top">Enable cookies</a>
    </div>
  </main>
</body>
</html>"#,
        globals = app_globals(params),
        redirect_url = js_string(params.redirect_url),
        href = html_attr(params.redirect_url),
    )
}

/// Navigates the top window to `redirect_url`.
///
/// At the top level the page sets `window.location.href`; inside the admin
/// iframe it dispatches App Bridge's `Redirect.Action.REMOTE`, which makes
/// the parent frame navigate.
#[must_use]
pub fn redirection_page(params: &PageParams<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Redirecting…</title>
  <script src="{APP_BRIDGE_SRC}"></script>
  <script type="text/javascript">
    document.addEventListener("DOMContentLoaded", function() {{
      var redirectUrl = {redirect_url};
      if (window.top === window.self) {{
        window.location.href = redirectUrl;
      }} else {{
        var AppBridge = window["app-bridge"];
        var Redirect = AppBridge.actions.Redirect;
        var app = AppBridge.default({{
          apiKey: {api_key},
          host: {host},
          shopOrigin: {shop_origin},
        }});
        Redirect.create(app).dispatch(Redirect.Action.REMOTE, redirectUrl);
      }}
    }});
  </script>
</head>
<body></body>
</html>"#,
        redirect_url = js_string(params.redirect_url),
        api_key = js_string(params.api_key),
        host = js_string(params.host),
        shop_origin = js_string(params.shop_origin),
    )
}
