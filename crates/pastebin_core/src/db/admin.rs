//! Admin grant storage.

use crate::db::{encode, tables::*};
use crate::error::AppError;
use crate::models::user::{AdminGrant, UserId};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Accessor for the admin marker table.
pub struct AdminDb {
    db: Arc<redb::Database>,
}

impl AdminDb {
    /// Initialize the admin table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(ADMINS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Grant admin to an existing user. Existing grants are left untouched.
    ///
    /// # Returns
    /// `true` when a new grant was written.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user does not exist.
    pub fn grant(&self, user: UserId, now: DateTime<Utc>) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let users = write_txn.open_table(USERS)?;
            if users.get(user.0)?.is_none() {
                return Err(AppError::NotFound);
            }
            let mut admins = write_txn.open_table(ADMINS)?;
            if admins.get(user.0)?.is_some() {
                return Ok(false);
            }
            let encoded = encode(&AdminGrant {
                user_id: user,
                granted_at: now,
            })?;
            admins.insert(user.0, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    /// Remove the admin marker.
    ///
    /// # Returns
    /// `true` when a grant existed and was removed.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn revoke(&self, user: UserId) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut admins = write_txn.open_table(ADMINS)?;
            let removed = admins.remove(user.0)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// # Errors
    /// Returns an error when storage access fails.
    pub fn is_admin(&self, user: UserId) -> Result<bool, AppError> {
        let read_txn = self.db.begin_read()?;
        let admins = read_txn.open_table(ADMINS)?;
        Ok(admins.get(user.0)?.is_some())
    }
}
