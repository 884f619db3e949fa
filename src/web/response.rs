//! Response construction helpers.

use cookie::Cookie;
use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{HeaderValue, Response, StatusCode};

use crate::error::AuthError;

/// The response type produced by every handler.
pub type AuthResponse = Response<String>;

/// Reason phrase attached to error responses.
///
/// `http` responses carry no custom reason phrase, so the message travels as
/// a response extension. Framework adapters can copy it into a header or a
/// body; the flow itself never writes error bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusText(pub String);

/// Returns the [`StatusText`] of a response, if one was attached.
#[must_use]
pub fn status_text(response: &AuthResponse) -> Option<&str> {
    response
        .extensions()
        .get::<StatusText>()
        .map(|text| text.0.as_str())
}

pub(crate) fn empty(status: StatusCode) -> AuthResponse {
    let mut response = Response::new(String::new());
    *response.status_mut() = status;
    response
}

pub(crate) fn failure(status: StatusCode, text: impl Into<String>) -> AuthResponse {
    let mut response = empty(status);
    response.extensions_mut().insert(StatusText(text.into()));
    response
}

pub(crate) fn redirect(status: StatusCode, location: &str) -> Result<AuthResponse, AuthError> {
    let mut response = empty(status);
    response
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_str(location)?);
    Ok(response)
}

pub(crate) fn html(body: String) -> AuthResponse {
    let mut response = Response::new(body);
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html;charset=UTF-8"),
    );
    response
}

pub(crate) fn append_cookie(
    response: &mut AuthResponse,
    cookie: &Cookie<'_>,
) -> Result<(), AuthError> {
    response
        .headers_mut()
        .append(SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);
    Ok(())
}

/// Renders a client error as its `400` response.
pub(crate) fn client_error(error: &AuthError) -> AuthResponse {
    failure(error.status(), error.to_string())
}
