//! Database layer backed by redb.
//!
//! Every mutation runs inside a single redb write transaction. redb serializes
//! writers, so read-check-write sequences (dedup on create, ownership checks on
//! update/delete, the user cascade) are atomic without in-process locks.

/// Admin grant storage.
pub mod admin;
/// API key storage.
pub mod api_key;
/// Paste storage.
pub mod paste;
/// Session storage.
pub mod session;
/// redb table definitions.
pub mod tables;
/// Multi-table operations.
pub mod transactions;
/// User storage.
pub mod user;

use crate::error::AppError;
use redb::ReadableTable;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

pub use transactions::TransactionOps;

/// Database handle with per-entity accessors.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub pastes: paste::PasteDb,
    pub users: user::UserDb,
    pub sessions: session::SessionDb,
    pub api_keys: api_key::ApiKeyDb,
    pub admins: admin::AdminDb,
}

#[cfg(test)]
mod tests;

impl Database {
    /// Open (or create) the database file at `path` and initialize tables.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created, redb cannot
    /// open the file, or table initialization fails.
    pub fn new(path: &str) -> Result<Self, AppError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    AppError::StorageMessage(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        err
                    ))
                })?;
            }
        }

        let db = match redb::Database::create(path) {
            Ok(db) => Arc::new(db),
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(AppError::StorageMessage(format!(
                    "Database at {} is already open in another process.\n\
                    Stop the other pastebin instance or set PB_DATABASE_PATH to a different location.",
                    path
                )));
            }
            Err(err) => return Err(err.into()),
        };
        Self::from_shared(db)
    }

    /// Build a database handle from an existing shared redb instance.
    ///
    /// # Errors
    /// Returns an error if the required tables cannot be created.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, AppError> {
        Ok(Self {
            pastes: paste::PasteDb::new(db.clone())?,
            users: user::UserDb::new(db.clone())?,
            sessions: session::SessionDb::new(db.clone())?,
            api_keys: api_key::ApiKeyDb::new(db.clone())?,
            admins: admin::AdminDb::new(db.clone())?,
            db,
        })
    }

    /// Clone this handle for another subsystem in the same process.
    ///
    /// # Errors
    /// Returns an error if table initialization fails.
    pub fn share(&self) -> Result<Self, AppError> {
        Self::from_shared(self.db.clone())
    }

    /// Open and drop a read transaction; used by readiness probes.
    ///
    /// # Errors
    /// Returns an error if redb cannot start a read transaction.
    pub fn ping(&self) -> Result<(), AppError> {
        use redb::ReadableDatabase;
        let read_txn = self.db.begin_read()?;
        read_txn.open_table(tables::USERS)?;
        Ok(())
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, AppError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Allocate the next value of a monotonic counter. The first value is 1.
pub(crate) fn next_counter(
    counters: &mut redb::Table<&str, u64>,
    key: &str,
) -> Result<u64, AppError> {
    let current = counters.get(key)?.map(|guard| guard.value()).unwrap_or(0);
    let next = current
        .checked_add(1)
        .ok_or_else(|| AppError::StorageMessage(format!("Counter '{}' overflowed", key)))?;
    counters.insert(key, next)?;
    Ok(next)
}
