//! HTTP request handlers.

/// Login, registration and session endpoints.
pub mod account;
/// Admin-only user management.
pub mod admin;
/// API key management.
pub mod api_key;
/// Liveness and readiness probes.
pub mod health;
/// Upload, view, edit and listing endpoints.
pub mod paste;

use crate::error::HttpError;
use pastebin_core::AppError;

/// Run blocking service work (password hashing, mostly) off the async runtime.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, HttpError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(HttpError::from),
        Err(err) => {
            tracing::error!("Blocking task failed: {}", err);
            Err(HttpError(AppError::Internal))
        }
    }
}

/// Truthy query flag (`1`, `true`, `yes`, `on`).
pub(crate) fn query_flag(value: Option<&str>) -> bool {
    value
        .and_then(pastebin_core::env::parse_env_flag)
        .unwrap_or(false)
}
