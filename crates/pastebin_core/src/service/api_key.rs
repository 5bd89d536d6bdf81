//! API key issuance and validation.

use crate::clock::Clock;
use crate::db::{api_key::NewApiKey, Database};
use crate::error::AppError;
use crate::models::user::{ApiKey, ApiKeyId, User, UserId};
use crate::tokens;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

const INVALID_API_KEY: &str = "invalid API key";

#[derive(Clone)]
pub struct ApiKeyService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl ApiKeyService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Issue a `pb_`-prefixed key for `user`. Only a positive
    /// `expires_in_days` sets an expiry.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for a blank name, or
    /// [`AppError::NotFound`] when the user does not exist.
    pub fn create(
        &self,
        user: UserId,
        name: &str,
        expires_in_days: Option<i64>,
    ) -> Result<ApiKey, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name is required"));
        }
        let now = self.clock.now();
        let expires_at = expires_in_days
            .filter(|days| *days > 0)
            .and_then(Duration::try_days)
            .and_then(|ttl| now.checked_add_signed(ttl));

        let key = self.db.api_keys.create(NewApiKey {
            key: tokens::api_key_token(),
            name: name.to_string(),
            user_id: user,
            expires_at,
            created_at: now,
        })?;
        info!(user = user.0, key_id = key.id.0, "api key created");
        Ok(key)
    }

    /// Resolve a token to its user, stamping `last_used`.
    ///
    /// # Errors
    /// Returns [`AppError::Unauthorized`] when the token is unknown, expired,
    /// or belongs to a deleted user.
    pub fn validate(&self, token: &str) -> Result<User, AppError> {
        let Some(key) = self.db.api_keys.touch_valid(token, self.clock.now())? else {
            debug!("api key rejected");
            return Err(AppError::Unauthorized(INVALID_API_KEY.to_string()));
        };
        self.db
            .users
            .get(key.user_id)?
            .ok_or_else(|| AppError::Unauthorized(INVALID_API_KEY.to_string()))
    }

    /// # Errors
    /// Returns a storage error when the read fails.
    pub fn list_owned(&self, user: UserId) -> Result<Vec<ApiKey>, AppError> {
        self.db.api_keys.list_for_user(user)
    }

    /// Revoke one of `user`'s keys.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no key with that id belongs to `user`.
    pub fn delete(&self, key_id: ApiKeyId, user: UserId) -> Result<(), AppError> {
        if !self.db.api_keys.delete_owned(key_id, user)? {
            return Err(AppError::NotFound);
        }
        info!(user = user.0, key_id = key_id.0, "api key deleted");
        Ok(())
    }
}
