//! API key management for the signed-in user.

use crate::{error::HttpError, identity::Identity, AppState};
use axum::{extract::State, Extension, Json};
use pastebin_core::models::{ApiKey, ApiKeyId};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub name: String,
    /// Days until expiration; absent or non-positive never expires.
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteKeyRequest {
    pub id: ApiKeyId,
}

/// The caller's keys, key values included.
pub async fn list_keys(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<ApiKey>>, HttpError> {
    let user = identity.require()?;
    Ok(Json(state.services.api_keys.list_owned(user.id)?))
}

/// Issue a key for the caller. The key value stays visible in [`list_keys`].
///
/// # Errors
/// 401 anonymous, 400 blank name.
pub async fn create_key(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateKeyRequest>,
) -> Result<Json<ApiKey>, HttpError> {
    let user = identity.require()?;
    let key = state
        .services
        .api_keys
        .create(user.id, &body.name, body.expires_in_days)?;
    Ok(Json(key))
}

/// # Errors
/// 401 anonymous, 404 when the key does not exist or belongs to someone else.
pub async fn delete_key(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<DeleteKeyRequest>,
) -> Result<Json<Value>, HttpError> {
    let user = identity.require()?;
    state.services.api_keys.delete(body.id, user.id)?;
    Ok(Json(json!({ "success": true })))
}
