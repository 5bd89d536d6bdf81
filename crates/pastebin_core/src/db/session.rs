//! Session storage operations backed by redb.

use crate::db::{decode, encode, tables::*};
use crate::error::AppError;
use crate::models::user::{Session, UserId};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Accessor for session tables.
pub struct SessionDb {
    db: Arc<redb::Database>,
}

impl SessionDb {
    /// Initialize session tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(SESSIONS)?;
        write_txn.open_multimap_table(SESSIONS_BY_USER)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Persist a session. The referenced user must exist.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user is missing, or a storage
    /// error when the token already exists or the write fails.
    pub fn insert(&self, session: &Session) -> Result<(), AppError> {
        let encoded = encode(session)?;
        let write_txn = self.db.begin_write()?;
        {
            let users = write_txn.open_table(USERS)?;
            if users.get(session.user_id.0)?.is_none() {
                return Err(AppError::NotFound);
            }
            let mut sessions = write_txn.open_table(SESSIONS)?;
            let mut by_user = write_txn.open_multimap_table(SESSIONS_BY_USER)?;
            if sessions.get(session.token.as_str())?.is_some() {
                return Err(AppError::StorageMessage(
                    "Session token already exists".to_string(),
                ));
            }
            sessions.insert(session.token.as_str(), encoded.as_slice())?;
            by_user.insert(session.user_id.0, session.token.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Fetch a session by token, expired or not.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, token: &str) -> Result<Option<Session>, AppError> {
        let read_txn = self.db.begin_read()?;
        let sessions = read_txn.open_table(SESSIONS)?;
        match sessions.get(token)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove a session.
    ///
    /// # Returns
    /// `true` when a row was removed.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn delete(&self, token: &str) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut sessions = write_txn.open_table(SESSIONS)?;
            let mut by_user = write_txn.open_multimap_table(SESSIONS_BY_USER)?;
            let removed = sessions
                .remove(token)?
                .map(|guard| decode::<Session>(guard.value()))
                .transpose()?;
            if let Some(session) = &removed {
                by_user.remove(session.user_id.0, token)?;
            }
            removed.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Remove every session that has expired at `now`.
    ///
    /// # Returns
    /// Number of sessions removed.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut sessions = write_txn.open_table(SESSIONS)?;
            let mut by_user = write_txn.open_multimap_table(SESSIONS_BY_USER)?;

            let mut expired = Vec::new();
            for item in sessions.iter()? {
                let (_, value) = item?;
                let session: Session = decode(value.value())?;
                if session.is_expired(now) {
                    expired.push(session);
                }
            }
            for session in &expired {
                let _ = sessions.remove(session.token.as_str())?;
                by_user.remove(session.user_id.0, session.token.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Number of stored sessions for `user`, including expired rows not yet swept.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn count_for_user(&self, user: UserId) -> Result<usize, AppError> {
        let read_txn = self.db.begin_read()?;
        let by_user = read_txn.open_multimap_table(SESSIONS_BY_USER)?;
        let mut count = 0;
        for item in by_user.get(user.0)? {
            item?;
            count += 1;
        }
        Ok(count)
    }
}
