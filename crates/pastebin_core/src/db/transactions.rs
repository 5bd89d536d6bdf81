//! Atomic cross-table transaction helpers for user-wide mutations.

use super::tables::*;
use super::{decode, encode, Database};
use crate::db::paste::{deserialize_paste, owner_scope};
use crate::error::AppError;
use crate::models::user::{ApiKey, User, UserDeletion, UserId};
use chrono::{DateTime, Utc};
use redb::{ReadableMultimapTable, ReadableTable};

/// Atomic operations that touch several entity tables together.
pub struct TransactionOps;

fn collect_session_tokens(
    by_user: &redb::MultimapTable<u64, &str>,
    user: UserId,
) -> Result<Vec<String>, AppError> {
    let mut tokens = Vec::new();
    for item in by_user.get(user.0)? {
        tokens.push(item?.value().to_string());
    }
    Ok(tokens)
}

fn collect_owned_paste_ids(
    by_owner: &redb::MultimapTable<u64, &str>,
    user: UserId,
) -> Result<Vec<String>, AppError> {
    let mut ids = Vec::new();
    for item in by_owner.get(user.0)? {
        ids.push(item?.value().to_string());
    }
    Ok(ids)
}

fn collect_api_key_ids(
    by_user: &redb::MultimapTable<u64, u64>,
    user: UserId,
) -> Result<Vec<u64>, AppError> {
    let mut ids = Vec::new();
    for item in by_user.get(user.0)? {
        ids.push(item?.value());
    }
    Ok(ids)
}

impl TransactionOps {
    /// Remove a user and everything it owns in one write transaction.
    ///
    /// Order: sessions, API keys, pastes (soft-deleted and dropped from the
    /// fingerprint index), admin grant, then the user row and its username
    /// index entry. Any failure aborts the whole transaction.
    ///
    /// # Returns
    /// Counts of the rows affected.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user does not exist, or a storage
    /// error when any step fails.
    pub fn delete_user_cascade(
        db: &Database,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<UserDeletion, AppError> {
        let write_txn = db.db.begin_write()?;
        let deletion = {
            let mut users = write_txn.open_table(USERS)?;
            let mut users_by_name = write_txn.open_table(USERS_BY_NAME)?;
            let mut sessions = write_txn.open_table(SESSIONS)?;
            let mut sessions_by_user = write_txn.open_multimap_table(SESSIONS_BY_USER)?;
            let mut keys = write_txn.open_table(API_KEYS)?;
            let mut keys_by_token = write_txn.open_table(API_KEYS_BY_TOKEN)?;
            let mut keys_by_user = write_txn.open_multimap_table(API_KEYS_BY_USER)?;
            let mut pastes = write_txn.open_table(PASTES)?;
            let by_owner = write_txn.open_multimap_table(PASTES_BY_OWNER)?;
            let mut by_fingerprint = write_txn.open_multimap_table(PASTES_BY_FINGERPRINT)?;
            let mut admins = write_txn.open_table(ADMINS)?;

            let Some(record) = users
                .get(user.0)?
                .map(|guard| decode::<User>(guard.value()))
                .transpose()?
            else {
                return Err(AppError::NotFound);
            };

            let mut deletion = UserDeletion::default();

            for token in collect_session_tokens(&sessions_by_user, user)? {
                if sessions.remove(token.as_str())?.is_some() {
                    deletion.sessions += 1;
                }
            }
            let _ = sessions_by_user.remove_all(user.0)?;

            for key_id in collect_api_key_ids(&keys_by_user, user)? {
                let Some(key) = keys
                    .get(key_id)?
                    .map(|guard| decode::<ApiKey>(guard.value()))
                    .transpose()?
                else {
                    continue;
                };
                let _ = keys_by_token.remove(key.key.as_str())?;
                let _ = keys.remove(key_id)?;
                deletion.api_keys += 1;
            }
            let _ = keys_by_user.remove_all(user.0)?;

            let scope = owner_scope(Some(user));
            for paste_id in collect_owned_paste_ids(&by_owner, user)? {
                let Some(mut paste) = pastes
                    .get(paste_id.as_str())?
                    .map(|guard| deserialize_paste(guard.value()))
                    .transpose()?
                else {
                    continue;
                };
                if paste.is_deleted() {
                    continue;
                }
                by_fingerprint.remove((scope, paste.fingerprint.as_str()), paste_id.as_str())?;
                paste.deleted_at = Some(now);
                let encoded = encode(&paste)?;
                pastes.insert(paste_id.as_str(), encoded.as_slice())?;
                deletion.pastes += 1;
            }

            deletion.was_admin = admins.remove(user.0)?.is_some();

            let _ = users_by_name.remove(record.username.as_str())?;
            let _ = users.remove(user.0)?;
            deletion
        };
        write_txn.commit()?;
        Ok(deletion)
    }
}
