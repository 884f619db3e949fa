//! The embedded-app auth state machine.
//!
//! Apps rendered inside the Shopify admin iframe cannot rely on cookies:
//! Safari's Intelligent Tracking Prevention blocks them in third-party
//! frames unless the merchant grants storage access, and OAuth itself must
//! run in the top window. This module decides, per request, which of those
//! hoops the browser still has to jump through.
//!
//! - [`AuthHandler`]: serves the `/auth` paths (storage access, top-level
//!   breakout, OAuth start and callback, enable-cookies page)
//! - [`VerifyRequest`]: guards app routes (shop change, session validity)
//! - [`cookies`]: the cookie signals both of them read and write
//! - [`pages`]: the interstitial HTML documents

pub mod cookies;
mod handler;
pub mod pages;
mod verify;

pub use cookies::{
    RequestSignals, GRANTED_STORAGE_ACCESS_COOKIE, TEST_COOKIE, TOP_LEVEL_OAUTH_COOKIE,
};
pub use handler::{AfterAuth, AuthCallbackResult, AuthHandler, AuthRoute};
pub use verify::{VerifyOutcome, VerifyRequest, REAUTH_HEADER, REAUTH_URL_HEADER};
