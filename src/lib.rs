//! # Shopify Embedded Auth
//!
//! Server-side OAuth routing and request verification for Shopify apps that
//! are rendered inside the admin iframe.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`AuthConfig`] and [`AuthConfigBuilder`]
//! - [`AuthHandler`]: the `/auth` routes, negotiating storage access under
//!   ITP, breaking out of the iframe and running OAuth
//! - [`VerifyRequest`]: the guard for app routes, checking the stored
//!   session and sending the browser back through auth when needed
//! - Narrow collaborator traits ([`SessionStore`],
//!   [`OAuthProvider`](auth::oauth::OAuthProvider),
//!   [`ShopProbe`](clients::ShopProbe),
//!   [`SessionTokenDecoder`](auth::oauth::SessionTokenDecoder)) with bundled
//!   Shopify implementations for all but the store
//! - A framework-neutral seam: [`AuthRequest`] in,
//!   [`AuthResponse`] (`http::Response<String>`) out
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_embedded_auth::{AccessMode, ApiKey, ApiSecretKey, AuthConfig, HostUrl};
//!
//! let config = AuthConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .host(HostUrl::new("https://your-app.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .access_mode(AccessMode::Online)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.paths().callback, "/auth/callback");
//! ```
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopify_embedded_auth::{AuthHandler, AuthRequest, VerifyRequest};
//! use shopify_embedded_auth::embedded::VerifyOutcome;
//!
//! let config = Arc::new(config);
//! let store: Arc<dyn SessionStore> = Arc::new(MyStore::new());
//! let auth = AuthHandler::new(Arc::clone(&config), Arc::clone(&store));
//! let verify = VerifyRequest::new(config, store);
//!
//! // In your request handler:
//! let request = AuthRequest::from(&http_request);
//! if let Some(response) = auth.handle(&request).await? {
//!     return Ok(response);
//! }
//! match verify.verify(&request).await? {
//!     VerifyOutcome::Authorized { session, .. } => serve_app(session).await,
//!     VerifyOutcome::Reauthorize(response) => Ok(response),
//! }
//! ```
//!
//! ## Thread Safety
//!
//! All public types are `Send + Sync`. Configuration is immutable after
//! construction and shared through `Arc`; there is no global state.

pub mod auth;
pub mod clients;
pub mod config;
pub mod embedded;
pub mod error;
pub mod web;

pub use auth::{AuthScopes, Session, SessionStore, SessionStoreError};
pub use config::{
    AccessMode, ApiKey, ApiSecretKey, AuthConfig, AuthConfigBuilder, AuthPaths, HostUrl,
    ShopDomain,
};
pub use embedded::{AuthHandler, VerifyOutcome, VerifyRequest};
pub use error::{AuthError, ConfigError};
pub use web::{AuthRequest, AuthResponse, StatusText};
