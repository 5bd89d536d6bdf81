//! Helper functions shared by paste storage operations.

use crate::db::tables::ANONYMOUS_SCOPE;
use crate::models::paste::Paste;
use crate::models::user::UserId;
use chrono::{DateTime, Utc};

pub(crate) fn reverse_timestamp_key(created_at: DateTime<Utc>) -> u64 {
    // Pre-epoch timestamps are clamped so the key never underflows.
    let millis = created_at.timestamp_millis().max(0) as u64;
    u64::MAX.saturating_sub(millis)
}

/// Fingerprint-index scope for an owner. User ids start at 1, so 0 is free for anonymous.
pub(crate) fn owner_scope(owner: Option<UserId>) -> u64 {
    owner.map(|id| id.0).unwrap_or(ANONYMOUS_SCOPE)
}

pub(crate) fn deserialize_paste(bytes: &[u8]) -> Result<Paste, bincode::Error> {
    bincode::deserialize(bytes)
}
