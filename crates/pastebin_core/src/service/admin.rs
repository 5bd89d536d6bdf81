//! Privileged operations: admin grants, user listing and deletion.

use crate::clock::Clock;
use crate::db::{Database, TransactionOps};
use crate::error::AppError;
use crate::models::user::{User, UserDeletion, UserId, UserStats};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AdminService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Membership check. Storage failures count as "not an admin".
    pub fn is_admin(&self, user: UserId) -> bool {
        match self.db.admins.is_admin(user) {
            Ok(is_admin) => is_admin,
            Err(err) => {
                warn!(user = user.0, "admin lookup failed: {}", err);
                false
            }
        }
    }

    /// Grant admin. Promoting an existing admin is a no-op.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user does not exist.
    pub fn promote(&self, user: UserId) -> Result<(), AppError> {
        if self.db.admins.grant(user, self.clock.now())? {
            info!(user = user.0, "admin granted");
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`AppError::Validation`] when the user is not an admin.
    pub fn demote(&self, user: UserId) -> Result<(), AppError> {
        if !self.db.admins.revoke(user)? {
            return Err(AppError::validation("user is not an admin"));
        }
        info!(user = user.0, "admin revoked");
        Ok(())
    }

    /// Cascade-delete a user: sessions, API keys, pastes, admin grant, then
    /// the user row. All-or-nothing.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user does not exist.
    pub fn delete_user(&self, user: UserId) -> Result<UserDeletion, AppError> {
        let deletion = TransactionOps::delete_user_cascade(&self.db, user, self.clock.now())?;
        info!(
            user = user.0,
            sessions = deletion.sessions,
            api_keys = deletion.api_keys,
            pastes = deletion.pastes,
            "user deleted"
        );
        Ok(deletion)
    }

    /// All users, newest first.
    ///
    /// # Errors
    /// Returns a storage error when the read fails.
    pub fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.db.users.list()
    }

    /// # Errors
    /// Returns [`AppError::NotFound`] when the user does not exist.
    pub fn user_stats(&self, user: UserId) -> Result<UserStats, AppError> {
        let record = self.db.users.get(user)?.ok_or(AppError::NotFound)?;
        Ok(UserStats {
            user_id: record.id,
            username: record.username,
            created_at: record.created_at,
            paste_count: self.db.pastes.count_by_owner(user)?,
            session_count: self.db.sessions.count_for_user(user)?,
            api_key_count: self.db.api_keys.count_for_user(user)?,
            is_admin: self.db.admins.is_admin(user)?,
        })
    }
}
