//! Liveness and readiness probes.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `ok`, plus bind address, serve path and database location with `?verbose`.
pub async fn livez(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    if !params.contains_key("verbose") {
        return "ok".to_string();
    }
    format!(
        "ok\nbind: {}\nserve_path: {}\ndatabase: {}\n",
        state.config.bind, state.config.serve_path, state.config.database_path
    )
}

/// `ok` once the database answers a read transaction.
pub async fn readyz(State(state): State<AppState>) -> Result<&'static str, HttpError> {
    state.db.ping()?;
    Ok("ok")
}
