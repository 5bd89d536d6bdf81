//! Data models for persistence and HTTP payloads.

/// Paste models and request payloads.
pub mod paste;
/// Users, sessions, API keys and admin grants.
pub mod user;


pub use paste::{NewPaste, Paste, PasteUpdate, UploadRequest};
pub use user::{AdminGrant, ApiKey, ApiKeyId, Session, User, UserDeletion, UserId, UserStats, UserSummary};
