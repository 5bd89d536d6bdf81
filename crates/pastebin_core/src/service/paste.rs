//! Paste lifecycle: dedup on create, privacy-aware reads, owner-only edits.

use crate::clock::Clock;
use crate::constants::{DEFAULT_LANGUAGE, MAX_PASTE_SIZE};
use crate::db::{paste::CreateOutcome, Database};
use crate::error::AppError;
use crate::hash::fingerprint;
use crate::models::paste::{NewPaste, Paste, PasteUpdate};
use crate::models::user::UserId;
use crate::tokens;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Paste operations for the HTTP boundary.
#[derive(Clone)]
pub struct PasteService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.is_empty() {
        return Err(AppError::validation("content cannot be empty"));
    }
    if content.len() > MAX_PASTE_SIZE {
        return Err(AppError::validation(format!(
            "content exceeds maximum size of {} bytes",
            MAX_PASTE_SIZE
        )));
    }
    Ok(())
}

fn normalize_language(language: &str) -> String {
    let trimmed = language.trim();
    if trimmed.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

fn not_yours() -> AppError {
    AppError::Forbidden("you do not own this paste".to_string())
}

impl PasteService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Store a paste, or return the caller's existing live paste with identical content.
    ///
    /// # Errors
    /// - [`AppError::Validation`] for empty or oversized content, or a private
    ///   paste without an owner.
    /// - Storage errors from the write transaction.
    pub fn create(&self, new: NewPaste) -> Result<CreateOutcome, AppError> {
        validate_content(&new.content)?;
        if new.is_private && new.owner.is_none() {
            return Err(AppError::validation(
                "anonymous users cannot create private pastes",
            ));
        }

        let now = self.clock.now();
        let digest = fingerprint(new.content.as_bytes());
        let language = normalize_language(&new.language);
        let paste = new.into_paste(tokens::paste_id(), digest, language, now);

        let outcome = self.db.pastes.create_deduplicated(paste, now)?;
        match &outcome {
            CreateOutcome::Created(paste) => info!(
                id = %paste.id,
                owner = ?paste.owner.map(|id| id.0),
                bytes = paste.content.len(),
                "paste created"
            ),
            CreateOutcome::Existing(paste) => {
                debug!(id = %paste.id, "duplicate content, returning existing paste")
            }
        }
        Ok(outcome)
    }

    /// Fetch a paste for `viewer`.
    ///
    /// Missing, deleted, expired, and private-but-not-yours all surface as
    /// [`AppError::NotFound`].
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] or a storage error.
    pub fn get(&self, id: &str, viewer: Option<UserId>) -> Result<Paste, AppError> {
        let paste = self.db.pastes.get(id)?.ok_or(AppError::NotFound)?;
        if !paste.is_live(self.clock.now()) || !paste.is_visible_to(viewer) {
            return Err(AppError::NotFound);
        }
        Ok(paste)
    }

    /// Replace title, content, language and unlisted on `owner`'s paste.
    ///
    /// # Errors
    /// - [`AppError::Validation`] for invalid content.
    /// - [`AppError::NotFound`] when absent or deleted.
    /// - [`AppError::Forbidden`] when `owner` does not own the paste.
    pub fn update(
        &self,
        id: &str,
        update: PasteUpdate,
        owner: UserId,
    ) -> Result<Paste, AppError> {
        validate_content(&update.content)?;
        let now = self.clock.now();
        let digest = fingerprint(update.content.as_bytes());
        let language = normalize_language(&update.language);

        let updated = self.db.pastes.update_with(id, |paste| {
            if paste.is_deleted() {
                return Err(AppError::NotFound);
            }
            if !paste.is_owned_by(owner) {
                return Err(not_yours());
            }
            paste.title = update.title;
            paste.content = update.content;
            paste.fingerprint = digest;
            paste.language = language;
            paste.unlisted = update.unlisted;
            paste.updated_at = now;
            Ok(())
        });

        match updated {
            Ok(Some(paste)) => {
                debug!(id = %paste.id, "paste updated");
                Ok(paste)
            }
            Ok(None) => Err(AppError::NotFound),
            Err(AppError::Forbidden(message)) => {
                warn!(id, user = owner.0, "rejected update by non-owner");
                Err(AppError::Forbidden(message))
            }
            Err(err) => Err(err),
        }
    }

    /// Soft-delete `owner`'s paste.
    ///
    /// # Errors
    /// - [`AppError::NotFound`] when absent or already deleted.
    /// - [`AppError::Forbidden`] when `owner` does not own the paste.
    pub fn delete(&self, id: &str, owner: UserId) -> Result<(), AppError> {
        let now = self.clock.now();
        let deleted = self.db.pastes.update_with(id, |paste| {
            if paste.is_deleted() {
                return Err(AppError::NotFound);
            }
            if !paste.is_owned_by(owner) {
                return Err(not_yours());
            }
            paste.deleted_at = Some(now);
            Ok(())
        });

        match deleted {
            Ok(Some(_)) => {
                info!(id, user = owner.0, "paste deleted");
                Ok(())
            }
            Ok(None) => Err(AppError::NotFound),
            Err(AppError::Forbidden(message)) => {
                warn!(id, user = owner.0, "rejected delete by non-owner");
                Err(AppError::Forbidden(message))
            }
            Err(err) => Err(err),
        }
    }

    /// The owner's non-deleted pastes, newest first, private included.
    ///
    /// # Errors
    /// Returns a storage error when the read fails.
    pub fn list_owned(&self, owner: UserId) -> Result<Vec<Paste>, AppError> {
        self.db.pastes.list_by_owner(owner)
    }

    /// Publicly listed live pastes, newest first.
    ///
    /// # Errors
    /// Returns a storage error when the read fails.
    pub fn list_public(&self) -> Result<Vec<Paste>, AppError> {
        let now = self.clock.now();
        self.db
            .pastes
            .list_recent(|paste| paste.is_publicly_listed() && paste.is_live(now))
    }

    /// Case-sensitive substring search over the owner's own pastes.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for an empty query, or a storage error.
    pub fn search(&self, owner: UserId, query: &str) -> Result<Vec<Paste>, AppError> {
        if query.is_empty() {
            return Err(AppError::validation("search query cannot be empty"));
        }
        Ok(self
            .list_owned(owner)?
            .into_iter()
            .filter(|paste| paste.matches_query(query))
            .collect())
    }

    /// `true` iff a live paste `id` exists and is owned by `user`.
    pub fn can_edit(&self, id: &str, user: UserId) -> bool {
        match self.db.pastes.get(id) {
            Ok(Some(paste)) => paste.is_live(self.clock.now()) && paste.is_owned_by(user),
            Ok(None) => false,
            Err(err) => {
                warn!(id, "can_edit lookup failed: {}", err);
                false
            }
        }
    }

    /// Physically remove expired pastes.
    ///
    /// # Returns
    /// Number of rows removed.
    ///
    /// # Errors
    /// Returns a storage error when the purge fails.
    pub fn expire_sweep(&self) -> Result<usize, AppError> {
        let removed = self.db.pastes.purge_expired(self.clock.now())?;
        if removed > 0 {
            info!(removed, "expired pastes purged");
        }
        Ok(removed)
    }
}
