//! Shared constants used across pastebin crates.

/// Default listen address for the HTTP server.
pub const DEFAULT_BIND: &str = "0.0.0.0:3001";

/// Default URL prefix under which pastes are served.
pub const DEFAULT_SERVE_PATH: &str = "/p/";

/// Default database file location.
pub const DEFAULT_DATABASE_PATH: &str = "./pastes.redb";

/// Default configuration file looked up when none is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Maximum paste content size in bytes (10 MiB, inclusive).
pub const MAX_PASTE_SIZE: usize = 10 * 1024 * 1024;

/// Default HTTP body limit; leaves room for JSON escaping around a full-size paste.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * MAX_PASTE_SIZE;

/// Language tag applied when a paste does not name one.
pub const DEFAULT_LANGUAGE: &str = "text";

/// Length of generated paste identifiers.
pub const PASTE_ID_LEN: usize = 8;

/// Session lifetime from creation.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Prefix on every issued API key.
pub const API_KEY_PREFIX: &str = "pb_";

/// Random bytes behind session tokens and API keys (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Username length bounds, in characters.
pub const USERNAME_MIN_LEN: usize = 3;
/// Upper username length bound, in characters.
pub const USERNAME_MAX_LEN: usize = 50;
/// Minimum password length, in characters.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Default interval between expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;
