//! Paste HTTP handlers.

use super::query_flag;
use crate::{error::HttpError, identity::Identity, AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pastebin_core::models::paste::{NewPaste, Paste, PasteUpdate, UploadRequest};
use pastebin_core::text::normalize_optional_nonempty;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Query parameters for raw-text uploads.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub title: Option<String>,
    pub language: Option<String>,
    pub private: Option<String>,
    pub unlisted: Option<String>,
    /// Minutes until expiration.
    pub expires: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub raw: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Public shape of a viewed paste, with the viewer's edit permission.
///
/// Ownership, fingerprint and tombstone fields stay server-side.
#[derive(Debug, Serialize)]
pub struct PasteView<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub language: &'a str,
    pub is_private: bool,
    pub unlisted: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub can_edit: bool,
}

impl<'a> PasteView<'a> {
    pub fn new(paste: &'a Paste, can_edit: bool) -> Self {
        Self {
            id: &paste.id,
            title: &paste.title,
            content: &paste.content,
            language: &paste.language,
            is_private: paste.is_private,
            unlisted: paste.unlisted,
            expires_at: paste.expires_at,
            created_at: paste.created_at,
            updated_at: paste.updated_at,
            can_edit,
        }
    }
}

fn is_json_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

fn wants_plain_text(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("text/plain"))
        .unwrap_or(false)
}

/// Interpret an upload body: a JSON [`UploadRequest`] when it parses as one,
/// raw paste text otherwise.
fn parse_upload(
    body: String,
    params: UploadParams,
    owner: Option<pastebin_core::models::UserId>,
) -> Result<NewPaste, HttpError> {
    if let Ok(request) = serde_json::from_str::<UploadRequest>(&body) {
        if request.content.is_empty() {
            return Err(HttpError::bad_request("Empty paste"));
        }
        return Ok(request.into_new_paste(owner));
    }
    Ok(NewPaste {
        title: normalize_optional_nonempty(params.title).unwrap_or_default(),
        content: body,
        language: normalize_optional_nonempty(params.language).unwrap_or_default(),
        is_private: query_flag(params.private.as_deref()),
        unlisted: query_flag(params.unlisted.as_deref()),
        expires_in_minutes: params.expires,
        owner,
    })
}

/// Create a paste from a JSON or raw-text body.
///
/// Identical content from the same owner returns the existing paste's URL.
///
/// # Errors
/// - 400 for empty or oversized content.
/// - 401 for anonymous private uploads.
pub async fn upload(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, HttpError> {
    let new = parse_upload(body, params, identity.user_id())?;
    if new.is_private && new.owner.is_none() {
        return Err(HttpError::unauthorized(
            "Must be logged in to create private pastes",
        ));
    }

    let paste = state.services.pastes.create(new)?.into_paste();
    let url = format!("{}{}", state.config.serve_path, paste.id);
    if is_json_request(&headers) {
        Ok(Json(json!({ "url": url, "id": paste.id })).into_response())
    } else {
        Ok(url.into_response())
    }
}

/// Show a paste as JSON, or as raw text with `?raw=1` / `Accept: text/plain`.
///
/// # Errors
/// 404 when missing, deleted, expired, or private to someone else.
pub async fn view(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Query(params): Query<ViewParams>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let paste = state.services.pastes.get(&id, identity.user_id())?;
    if query_flag(params.raw.as_deref()) || wants_plain_text(&headers) {
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            paste.content,
        )
            .into_response());
    }

    let can_edit = identity
        .user_id()
        .map(|user| state.services.pastes.can_edit(&paste.id, user))
        .unwrap_or(false);
    Ok(Json(PasteView::new(&paste, can_edit)).into_response())
}

/// Replace an owned paste's content and metadata.
///
/// # Errors
/// 401 anonymous, 403 not the owner, 404 missing or deleted, 400 invalid content.
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<PasteUpdate>,
) -> Result<Response, HttpError> {
    let user = identity.require()?;
    let paste = state.services.pastes.update(&id, body, user.id)?;
    Ok(Json(json!({ "success": true, "paste": paste })).into_response())
}

/// Soft-delete an owned paste.
///
/// # Errors
/// 401 anonymous, 403 not the owner, 404 missing or already deleted.
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let user = identity.require()?;
    state.services.pastes.delete(&id, user.id)?;
    Ok(Json(json!({ "success": true })).into_response())
}

pub async fn search(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Paste>>, HttpError> {
    let user = identity.require()?;
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| HttpError::bad_request("Missing search query"))?;
    Ok(Json(state.services.pastes.search(user.id, &query)?))
}

pub async fn my_pastes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Paste>>, HttpError> {
    let user = identity.require()?;
    Ok(Json(state.services.pastes.list_owned(user.id)?))
}

/// Public listing, rendered through [`PasteView`].
pub async fn all_pastes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, HttpError> {
    let viewer = identity.user_id();
    let pastes = state.services.pastes.list_public()?;
    let views: Vec<PasteView<'_>> = pastes
        .iter()
        .map(|paste| {
            let can_edit = viewer.map(|user| paste.is_owned_by(user)).unwrap_or(false);
            PasteView::new(paste, can_edit)
        })
        .collect();
    Ok(Json(views).into_response())
}
