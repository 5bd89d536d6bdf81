//! Request identity resolution.
//!
//! Every request passes through [`identity_middleware`], which attaches an
//! [`Identity`] extension. Credentials are tried in order: an API key from the
//! `Authorization` header, then the `session` cookie. Invalid credentials fall
//! through to anonymous instead of failing the request.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use pastebin_core::models::user::{User, UserId};
use pastebin_core::tokens::looks_like_api_key;
use pastebin_core::{SESSION_COOKIE_NAME, SESSION_TTL_DAYS};

/// The caller behind a request, if any.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<User>);

impl Identity {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.0.as_ref().map(|user| user.id)
    }

    /// The authenticated user, or 401.
    ///
    /// # Errors
    /// Returns an unauthorized [`HttpError`] for anonymous callers.
    pub fn require(&self) -> Result<&User, HttpError> {
        self.user()
            .ok_or_else(|| HttpError::unauthorized("Authentication required"))
    }
}

/// API key carried by the `Authorization` header.
///
/// Accepts `Bearer <key>` (scheme is case-insensitive) or a bare key that has
/// the API key shape.
pub fn api_key_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => {
            Some(value[7..].trim()).filter(|key| !key.is_empty())
        }
        _ if looks_like_api_key(value) => Some(value),
        _ => None,
    }
}

/// Value of the `session` cookie, if present and non-empty.
pub fn session_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that installs a session token.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
        SESSION_COOKIE_NAME,
        token,
        SESSION_TTL_DAYS * 24 * 60 * 60
    )
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict",
        SESSION_COOKIE_NAME
    )
}

fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Identity {
    if let Some(key) = api_key_from_headers(headers) {
        match state.services.api_keys.validate(key) {
            Ok(user) => return Identity(Some(user)),
            Err(err) => tracing::debug!("API key rejected: {}", err),
        }
    }
    if let Some(token) = session_from_headers(headers) {
        match state.services.auth.resolve_session_user(token) {
            Ok(user) => return Identity(Some(user)),
            Err(err) => tracing::debug!("Session rejected: {}", err),
        }
    }
    Identity::default()
}

/// Attach the caller's [`Identity`] to the request.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = resolve_identity(&state, req.headers());
    req.extensions_mut().insert(identity);
    next.run(req).await
}
