//! redb table definitions shared by storage modules.

use redb::{MultimapTableDefinition, TableDefinition};

/// Canonical paste rows (`Paste`, bincode-encoded).
pub const PASTES: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes");
/// Recency index ordered by reverse creation millis then id.
pub const PASTES_BY_CREATED: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("pastes_by_created");
/// Owner id -> paste ids. Anonymous pastes are not indexed here.
pub const PASTES_BY_OWNER: MultimapTableDefinition<u64, &str> =
    MultimapTableDefinition::new("pastes_by_owner");
/// (owner scope, fingerprint) -> ids of non-deleted pastes. Scope 0 is anonymous.
pub const PASTES_BY_FINGERPRINT: MultimapTableDefinition<(u64, &str), &str> =
    MultimapTableDefinition::new("pastes_by_fingerprint");

/// Canonical user rows (`User`, bincode-encoded).
pub const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
/// Unique username index.
pub const USERS_BY_NAME: TableDefinition<&str, u64> = TableDefinition::new("users_by_name");

/// Session rows keyed by token (`Session`, bincode-encoded).
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
/// User id -> session tokens.
pub const SESSIONS_BY_USER: MultimapTableDefinition<u64, &str> =
    MultimapTableDefinition::new("sessions_by_user");

/// API key rows keyed by id (`ApiKey`, bincode-encoded).
pub const API_KEYS: TableDefinition<u64, &[u8]> = TableDefinition::new("api_keys");
/// Unique token index.
pub const API_KEYS_BY_TOKEN: TableDefinition<&str, u64> = TableDefinition::new("api_keys_by_token");
/// User id -> API key ids.
pub const API_KEYS_BY_USER: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("api_keys_by_user");

/// Admin grants keyed by user id (`AdminGrant`, bincode-encoded).
pub const ADMINS: TableDefinition<u64, &[u8]> = TableDefinition::new("admins");

/// Monotonic id counters.
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Counter key for user ids.
pub const USER_ID_COUNTER: &str = "user_id";
/// Counter key for API key ids.
pub const API_KEY_ID_COUNTER: &str = "api_key_id";

/// Fingerprint-index scope used for pastes without an owner.
pub const ANONYMOUS_SCOPE: u64 = 0;
