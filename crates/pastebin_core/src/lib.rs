//! Core domain library for the pastebin (config, storage, models, services).

/// Time source abstraction used for expiration checks.
pub mod clock;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Database access layer and transactions.
pub mod db;
/// Process environment helpers.
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Content fingerprinting for deduplication.
pub mod hash;
/// Data models for persistence and API payloads.
pub mod models;
/// Authentication, paste, API key and admin services.
pub mod service;
/// Text normalization helpers.
pub mod text;
/// Random identifier and credential generation.
pub mod tokens;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use constants::*;
pub use db::Database;
pub use error::AppError;
pub use service::Services;
