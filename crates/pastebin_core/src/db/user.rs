//! User storage operations backed by redb.

use crate::db::{decode, encode, next_counter, tables::*};
use crate::error::AppError;
use crate::models::user::{User, UserId};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Accessor for user tables.
pub struct UserDb {
    db: Arc<redb::Database>,
}

impl UserDb {
    /// Initialize user tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USERS)?;
        write_txn.open_table(USERS_BY_NAME)?;
        write_txn.open_table(COUNTERS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert a user with a freshly allocated id.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when the username is taken, or a storage
    /// error when the write fails.
    pub fn create(
        &self,
        username: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_name = write_txn.open_table(USERS_BY_NAME)?;
            let mut counters = write_txn.open_table(COUNTERS)?;

            if by_name.get(username)?.is_some() {
                return Err(AppError::validation("username already exists"));
            }

            let id = UserId(next_counter(&mut counters, USER_ID_COUNTER)?);
            let user = User {
                id,
                username: username.to_string(),
                password_hash,
                created_at: now,
            };
            let encoded = encode(&user)?;
            users.insert(id.0, encoded.as_slice())?;
            by_name.insert(username, id.0)?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: UserId) -> Result<Option<User>, AppError> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id.0)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Fetch a user by exact username.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let read_txn = self.db.begin_read()?;
        let by_name = read_txn.open_table(USERS_BY_NAME)?;
        let Some(id) = by_name.get(username)?.map(|guard| guard.value()) else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// All users, newest first.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list(&self) -> Result<Vec<User>, AppError> {
        let read_txn = self.db.begin_read()?;
        let users_table = read_txn.open_table(USERS)?;
        let mut users = Vec::new();
        for item in users_table.iter()? {
            let (_, value) = item?;
            users.push(decode::<User>(value.value())?);
        }
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }
}
