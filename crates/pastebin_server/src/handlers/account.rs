//! Registration, login, logout and the current-user probe.

use super::blocking;
use crate::{
    error::HttpError,
    identity::{clear_session_cookie, session_cookie, session_from_headers, Identity},
    AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use pastebin_core::models::User;
use serde::Deserialize;
use serde_json::{json, Value};

/// Username/password body shared by register and login.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn signed_in(state: &AppState, user: &User) -> Result<Response, HttpError> {
    let session = state.services.auth.create_session(user.id)?;
    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(json!({ "success": true, "username": user.username })),
    )
        .into_response())
}

/// Create an account and sign it in.
///
/// # Errors
/// 400 for invalid or taken usernames and short passwords.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Response, HttpError> {
    let auth = state.services.auth.clone();
    let user = blocking(move || auth.register(&body.username, &body.password)).await?;
    signed_in(&state, &user)
}

/// Check credentials and start a session.
///
/// # Errors
/// 401 when the username is unknown or the password is wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Response, HttpError> {
    let auth = state.services.auth.clone();
    let user = blocking(move || auth.login(&body.username, &body.password)).await?;
    tracing::debug!(user = user.id.0, "login succeeded");
    signed_in(&state, &user)
}

/// Drop the caller's session (if any) and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    if let Some(token) = session_from_headers(&headers) {
        state.services.auth.delete_session(token)?;
    }
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({ "success": true })),
    )
        .into_response())
}

pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<Value> {
    match identity.user() {
        Some(user) => Json(json!({
            "authenticated": true,
            "username": user.username,
            "user_id": user.id,
            "is_admin": state.services.admin.is_admin(user.id),
        })),
        None => Json(json!({ "authenticated": false })),
    }
}
