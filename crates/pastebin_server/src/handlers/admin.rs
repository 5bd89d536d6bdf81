//! Admin-only user management.

use crate::{error::HttpError, identity::Identity, AppState};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use pastebin_core::models::{User, UserId, UserStats, UserSummary};
use pastebin_core::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub user_id: UserId,
}

fn require_admin<'a>(state: &AppState, identity: &'a Identity) -> Result<&'a User, HttpError> {
    let user = identity.require()?;
    if !state.services.admin.is_admin(user.id) {
        tracing::warn!(user = user.id.0, "non-admin hit an admin endpoint");
        return Err(HttpError(AppError::Forbidden("Forbidden".to_string())));
    }
    Ok(user)
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<UserSummary>>, HttpError> {
    require_admin(&state, &identity)?;
    let users = state.services.admin.list_users()?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

pub async fn user_stats(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserStats>, HttpError> {
    require_admin(&state, &identity)?;
    Ok(Json(state.services.admin.user_stats(UserId(user_id))?))
}

/// Delete a user and everything they own.
///
/// # Errors
/// 401/403 for non-admins, 400 when deleting yourself, 404 for unknown users.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<DeleteUserRequest>,
) -> Result<Json<Value>, HttpError> {
    let admin = require_admin(&state, &identity)?;
    if admin.id == body.user_id {
        return Err(HttpError::bad_request("Cannot delete your own account"));
    }
    let deletion = state.services.admin.delete_user(body.user_id)?;
    Ok(Json(json!({ "success": true, "deleted": deletion })))
}
