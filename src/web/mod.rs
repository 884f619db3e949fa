//! The request/response seam between the auth flow and a web framework.
//!
//! Handlers take an [`AuthRequest`] and return an [`AuthResponse`]
//! (`http::Response<String>`). Any framework built on the `http` crate
//! (axum, hyper, actix via conversion) can adapt both in a few lines.

mod request;
mod response;

pub use request::AuthRequest;
pub use response::{status_text, AuthResponse, StatusText};

pub(crate) use response::{append_cookie, client_error, empty, failure, html, redirect};
