//! Sessions, scopes and the OAuth collaborators.
//!
//! - [`Session`]: an authenticated shop install
//! - [`AuthScopes`]: scope sets with implied-scope expansion
//! - [`SessionStore`]: the application's session persistence
//! - [`oauth`]: authorization begin/validate, HMAC, state and session tokens
//!
//! # Example
//!
//! ```rust
//! use shopify_embedded_auth::{AuthScopes, Session, ShopDomain};
//!
//! let session = Session::new(
//!     "offline_my-store.myshopify.com".to_string(),
//!     ShopDomain::new("my-store").unwrap(),
//!     "access-token".to_string(),
//!     "read_products".parse().unwrap(),
//!     false,
//!     None,
//! );
//!
//! let required: AuthScopes = "read_products".parse().unwrap();
//! assert_eq!(session.scopes, required);
//! ```

pub mod oauth;
mod scopes;
pub mod session;
mod store;

pub use scopes::AuthScopes;
pub use session::Session;
pub use store::{SessionStore, SessionStoreError};
