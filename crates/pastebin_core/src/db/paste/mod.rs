//! Paste storage operations backed by redb.

mod helpers;

use crate::{db::tables::*, error::AppError, models::paste::Paste, models::user::UserId};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableMultimapTable, ReadableTable};
use std::sync::Arc;

pub(crate) use self::helpers::{deserialize_paste, owner_scope, reverse_timestamp_key};

/// Result of a deduplicating insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new row was written.
    Created(Paste),
    /// A live paste with identical content already existed in the owner scope.
    Existing(Paste),
}

impl CreateOutcome {
    pub fn paste(&self) -> &Paste {
        match self {
            Self::Created(paste) | Self::Existing(paste) => paste,
        }
    }

    pub fn into_paste(self) -> Paste {
        match self {
            Self::Created(paste) | Self::Existing(paste) => paste,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Accessor for paste-related redb tables.
pub struct PasteDb {
    db: Arc<redb::Database>,
}

impl PasteDb {
    /// Initialize paste tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(PASTES)?;
        write_txn.open_table(PASTES_BY_CREATED)?;
        write_txn.open_multimap_table(PASTES_BY_OWNER)?;
        write_txn.open_multimap_table(PASTES_BY_FINGERPRINT)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert `paste` unless a live paste with the same fingerprint already
    /// exists in the same owner scope, in which case that paste is returned.
    ///
    /// Lookup and insert share one write transaction. Candidates that are
    /// soft-deleted or expired at `now` never match.
    ///
    /// # Errors
    /// Returns an error when the id already exists, serialization fails, or
    /// storage operations fail.
    pub fn create_deduplicated(
        &self,
        paste: Paste,
        now: DateTime<Utc>,
    ) -> Result<CreateOutcome, AppError> {
        let scope = owner_scope(paste.owner);
        let write_txn = self.db.begin_write()?;
        {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut created = write_txn.open_table(PASTES_BY_CREATED)?;
            let mut by_owner = write_txn.open_multimap_table(PASTES_BY_OWNER)?;
            let mut by_fingerprint = write_txn.open_multimap_table(PASTES_BY_FINGERPRINT)?;

            let mut candidate_ids = Vec::new();
            for item in by_fingerprint.get((scope, paste.fingerprint.as_str()))? {
                candidate_ids.push(item?.value().to_string());
            }
            for candidate_id in candidate_ids {
                let Some(guard) = pastes.get(candidate_id.as_str())? else {
                    continue;
                };
                let existing = deserialize_paste(guard.value())?;
                if existing.owner == paste.owner && existing.is_live(now) {
                    // Returning without commit aborts the transaction.
                    return Ok(CreateOutcome::Existing(existing));
                }
            }

            if pastes.get(paste.id.as_str())?.is_some() {
                return Err(AppError::StorageMessage(format!(
                    "Paste id '{}' already exists",
                    paste.id
                )));
            }

            let encoded = bincode::serialize(&paste)?;
            pastes.insert(paste.id.as_str(), encoded.as_slice())?;
            created.insert(
                (reverse_timestamp_key(paste.created_at), paste.id.as_str()),
                (),
            )?;
            if let Some(owner) = paste.owner {
                by_owner.insert(owner.0, paste.id.as_str())?;
            }
            by_fingerprint.insert((scope, paste.fingerprint.as_str()), paste.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(CreateOutcome::Created(paste))
    }

    /// Fetch a paste by id, including deleted and expired rows.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: &str) -> Result<Option<Paste>, AppError> {
        let read_txn = self.db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        match pastes.get(id)? {
            Some(value) => Ok(Some(deserialize_paste(value.value())?)),
            None => Ok(None),
        }
    }

    /// Load a paste, let `mutate` validate and change it, then persist the
    /// result with its fingerprint index entry kept in sync.
    ///
    /// `mutate` runs inside the write transaction; when it returns an error
    /// nothing is written. Tombstoned rows are dropped from the fingerprint
    /// index so they never satisfy dedup again.
    ///
    /// # Returns
    /// `Ok(Some(paste))` when updated, `Ok(None)` when the id is missing.
    ///
    /// # Errors
    /// Returns the closure's error, or an error when storage access or
    /// serialization fails.
    pub fn update_with<F>(&self, id: &str, mutate: F) -> Result<Option<Paste>, AppError>
    where
        F: FnOnce(&mut Paste) -> Result<(), AppError>,
    {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut by_fingerprint = write_txn.open_multimap_table(PASTES_BY_FINGERPRINT)?;

            let Some(old_guard) = pastes.get(id)? else {
                return Ok(None);
            };
            let mut paste = deserialize_paste(old_guard.value())?;
            drop(old_guard);

            let scope = owner_scope(paste.owner);
            let old_fingerprint = paste.fingerprint.clone();
            let was_deleted = paste.is_deleted();

            mutate(&mut paste)?;

            let index_changed =
                old_fingerprint != paste.fingerprint || was_deleted != paste.is_deleted();
            if index_changed {
                if !was_deleted {
                    by_fingerprint.remove((scope, old_fingerprint.as_str()), id)?;
                }
                if !paste.is_deleted() {
                    by_fingerprint.insert((scope, paste.fingerprint.as_str()), id)?;
                }
            }

            let encoded = bincode::serialize(&paste)?;
            pastes.insert(id, encoded.as_slice())?;
            paste
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    /// Non-deleted pastes owned by `owner`, newest first.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list_by_owner(&self, owner: UserId) -> Result<Vec<Paste>, AppError> {
        let read_txn = self.db.begin_read()?;
        let by_owner = read_txn.open_multimap_table(PASTES_BY_OWNER)?;
        let pastes_table = read_txn.open_table(PASTES)?;

        let mut pastes = Vec::new();
        for item in by_owner.get(owner.0)? {
            let id_guard = item?;
            let Some(paste_guard) = pastes_table.get(id_guard.value())? else {
                continue;
            };
            let paste = deserialize_paste(paste_guard.value())?;
            if !paste.is_deleted() {
                pastes.push(paste);
            }
        }
        pastes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(pastes)
    }

    /// Walk the recency index and keep rows accepted by `filter`, newest first.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list_recent<F>(&self, mut filter: F) -> Result<Vec<Paste>, AppError>
    where
        F: FnMut(&Paste) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let created_table = read_txn.open_table(PASTES_BY_CREATED)?;
        let pastes_table = read_txn.open_table(PASTES)?;

        let mut pastes = Vec::new();
        for item in created_table.iter()? {
            let (key, _) = item?;
            let (_, paste_id) = key.value();
            let Some(paste_guard) = pastes_table.get(paste_id)? else {
                continue;
            };
            let paste = deserialize_paste(paste_guard.value())?;
            if filter(&paste) {
                pastes.push(paste);
            }
        }
        Ok(pastes)
    }

    /// Number of non-deleted pastes owned by `owner`.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn count_by_owner(&self, owner: UserId) -> Result<usize, AppError> {
        Ok(self.list_by_owner(owner)?.len())
    }

    /// Physically remove every paste whose expiration instant is before `now`,
    /// tombstoned rows included, together with all of their index entries.
    ///
    /// # Returns
    /// Number of rows removed.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut created = write_txn.open_table(PASTES_BY_CREATED)?;
            let mut by_owner = write_txn.open_multimap_table(PASTES_BY_OWNER)?;
            let mut by_fingerprint = write_txn.open_multimap_table(PASTES_BY_FINGERPRINT)?;

            let mut expired = Vec::new();
            for item in pastes.iter()? {
                let (_, value) = item?;
                let paste = deserialize_paste(value.value())?;
                if paste.is_expired(now) {
                    expired.push(paste);
                }
            }

            for paste in &expired {
                let id = paste.id.as_str();
                let _ = pastes.remove(id)?;
                let _ = created.remove((reverse_timestamp_key(paste.created_at), id))?;
                if let Some(owner) = paste.owner {
                    by_owner.remove(owner.0, id)?;
                }
                by_fingerprint.remove((owner_scope(paste.owner), paste.fingerprint.as_str()), id)?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests;
