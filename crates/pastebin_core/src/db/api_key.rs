//! API key storage operations backed by redb.

use crate::db::{decode, encode, next_counter, tables::*};
use crate::error::AppError;
use crate::models::user::{ApiKey, ApiKeyId, UserId};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Fields for a key that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub key: String,
    pub name: String,
    pub user_id: UserId,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Accessor for API key tables.
pub struct ApiKeyDb {
    db: Arc<redb::Database>,
}

impl ApiKeyDb {
    /// Initialize API key tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(API_KEYS)?;
        write_txn.open_table(API_KEYS_BY_TOKEN)?;
        write_txn.open_multimap_table(API_KEYS_BY_USER)?;
        write_txn.open_table(COUNTERS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Persist a key with a freshly allocated id. The owning user must exist.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user is missing, or a storage
    /// error when the token collides or the write fails.
    pub fn create(&self, new_key: NewApiKey) -> Result<ApiKey, AppError> {
        let write_txn = self.db.begin_write()?;
        let key = {
            let users = write_txn.open_table(USERS)?;
            if users.get(new_key.user_id.0)?.is_none() {
                return Err(AppError::NotFound);
            }
            let mut keys = write_txn.open_table(API_KEYS)?;
            let mut by_token = write_txn.open_table(API_KEYS_BY_TOKEN)?;
            let mut by_user = write_txn.open_multimap_table(API_KEYS_BY_USER)?;
            let mut counters = write_txn.open_table(COUNTERS)?;

            if by_token.get(new_key.key.as_str())?.is_some() {
                return Err(AppError::StorageMessage(
                    "API key token already exists".to_string(),
                ));
            }

            let id = ApiKeyId(next_counter(&mut counters, API_KEY_ID_COUNTER)?);
            let key = ApiKey {
                id,
                key: new_key.key,
                name: new_key.name,
                user_id: new_key.user_id,
                expires_at: new_key.expires_at,
                last_used: None,
                created_at: new_key.created_at,
            };
            let encoded = encode(&key)?;
            keys.insert(id.0, encoded.as_slice())?;
            by_token.insert(key.key.as_str(), id.0)?;
            by_user.insert(key.user_id.0, id.0)?;
            key
        };
        write_txn.commit()?;
        Ok(key)
    }

    /// Fetch a key by its token, expired or not.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get_by_token(&self, token: &str) -> Result<Option<ApiKey>, AppError> {
        let read_txn = self.db.begin_read()?;
        let by_token = read_txn.open_table(API_KEYS_BY_TOKEN)?;
        let Some(id) = by_token.get(token)?.map(|guard| guard.value()) else {
            return Ok(None);
        };
        let keys = read_txn.open_table(API_KEYS)?;
        match keys.get(id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a key by token and, when it is unexpired at `now`, stamp
    /// `last_used` in the same transaction.
    ///
    /// # Returns
    /// `Ok(Some(key))` with the updated row, `Ok(None)` when the token is
    /// unknown or expired.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn touch_valid(&self, token: &str, now: DateTime<Utc>) -> Result<Option<ApiKey>, AppError> {
        let write_txn = self.db.begin_write()?;
        let key = {
            let by_token = write_txn.open_table(API_KEYS_BY_TOKEN)?;
            let mut keys = write_txn.open_table(API_KEYS)?;

            let Some(id) = by_token.get(token)?.map(|guard| guard.value()) else {
                return Ok(None);
            };
            let Some(mut key) = keys
                .get(id)?
                .map(|guard| decode::<ApiKey>(guard.value()))
                .transpose()?
            else {
                return Ok(None);
            };
            if key.is_expired(now) {
                return Ok(None);
            }
            key.last_used = Some(now);
            let encoded = encode(&key)?;
            keys.insert(id, encoded.as_slice())?;
            key
        };
        write_txn.commit()?;
        Ok(Some(key))
    }

    /// Keys owned by `user`, newest first.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list_for_user(&self, user: UserId) -> Result<Vec<ApiKey>, AppError> {
        let read_txn = self.db.begin_read()?;
        let by_user = read_txn.open_multimap_table(API_KEYS_BY_USER)?;
        let keys_table = read_txn.open_table(API_KEYS)?;

        let mut keys = Vec::new();
        for item in by_user.get(user.0)? {
            let id = item?.value();
            if let Some(value) = keys_table.get(id)? {
                keys.push(decode::<ApiKey>(value.value())?);
            }
        }
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(keys)
    }

    /// Delete key `id` when it belongs to `user`.
    ///
    /// # Returns
    /// `true` when a key was removed; `false` when no such key belongs to `user`.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn delete_owned(&self, id: ApiKeyId, user: UserId) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut keys = write_txn.open_table(API_KEYS)?;
            let mut by_token = write_txn.open_table(API_KEYS_BY_TOKEN)?;
            let mut by_user = write_txn.open_multimap_table(API_KEYS_BY_USER)?;

            let Some(key) = keys
                .get(id.0)?
                .map(|guard| decode::<ApiKey>(guard.value()))
                .transpose()?
            else {
                return Ok(false);
            };
            if key.user_id != user {
                return Ok(false);
            }
            let _ = keys.remove(id.0)?;
            let _ = by_token.remove(key.key.as_str())?;
            by_user.remove(user.0, id.0)?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    /// Number of keys owned by `user`.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn count_for_user(&self, user: UserId) -> Result<usize, AppError> {
        let read_txn = self.db.begin_read()?;
        let by_user = read_txn.open_multimap_table(API_KEYS_BY_USER)?;
        let mut count = 0;
        for item in by_user.get(user.0)? {
            item?;
            count += 1;
        }
        Ok(count)
    }
}
