//! Paste models.

use super::user::UserId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A stored paste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    pub id: String,
    pub title: String,
    pub content: String,
    /// BLAKE3 fingerprint of `content`; kept in sync on every content write.
    pub fingerprint: String,
    pub language: String,
    pub is_private: bool,
    pub unlisted: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Paste {
    /// `true` once the expiration instant has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now > at).unwrap_or(false)
    }

    /// `true` when the paste carries a soft-delete tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Neither deleted nor expired at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_deleted() && !self.is_expired(now)
    }

    /// `true` when `user` owns this paste. Anonymous pastes have no owner.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == Some(user)
    }

    /// Whether `viewer` may read this paste, ignoring deletion and expiry.
    pub fn is_visible_to(&self, viewer: Option<UserId>) -> bool {
        !self.is_private || viewer.map(|id| self.is_owned_by(id)).unwrap_or(false)
    }

    /// Included in the public listing: neither private nor unlisted.
    pub fn is_publicly_listed(&self) -> bool {
        !self.is_private && !self.unlisted
    }

    /// Case-sensitive substring match over title and content.
    pub fn matches_query(&self, query: &str) -> bool {
        self.title.contains(query) || self.content.contains(query)
    }
}

/// Input for creating a paste.
#[derive(Debug, Clone, Default)]
pub struct NewPaste {
    pub title: String,
    pub content: String,
    pub language: String,
    pub is_private: bool,
    pub unlisted: bool,
    /// Minutes until expiration; `None` or a non-positive value never expires.
    pub expires_in_minutes: Option<i64>,
    pub owner: Option<UserId>,
}

impl NewPaste {
    /// Convenience constructor for a public paste with default metadata.
    pub fn text(content: impl Into<String>, owner: Option<UserId>) -> Self {
        Self {
            content: content.into(),
            owner,
            ..Self::default()
        }
    }

    /// Absolute expiration computed from `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in_minutes
            .filter(|minutes| *minutes > 0)
            .and_then(Duration::try_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
    }

    pub(crate) fn into_paste(
        self,
        id: String,
        fingerprint: String,
        language: String,
        now: DateTime<Utc>,
    ) -> Paste {
        let expires_at = self.expires_at(now);
        Paste {
            id,
            title: self.title,
            content: self.content,
            fingerprint,
            language,
            is_private: self.is_private,
            unlisted: self.unlisted,
            expires_at,
            owner: self.owner,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Replacement values for an owner edit. Privacy and expiry are not editable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasteUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub unlisted: bool,
}

/// JSON body accepted by the upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadRequest {
    pub title: String,
    pub content: String,
    pub language: String,
    pub is_private: bool,
    pub unlisted: bool,
    /// Minutes until expiration.
    pub expires_in: Option<i64>,
}

impl UploadRequest {
    /// Convert into a service request on behalf of `owner`.
    pub fn into_new_paste(self, owner: Option<UserId>) -> NewPaste {
        NewPaste {
            title: self.title,
            content: self.content,
            language: self.language,
            is_private: self.is_private,
            unlisted: self.unlisted,
            expires_in_minutes: self.expires_in,
            owner,
        }
    }
}
