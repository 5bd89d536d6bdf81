//! Random identifiers and bearer credentials.

use crate::constants::{API_KEY_PREFIX, PASTE_ID_LEN, TOKEN_BYTES};
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Generate a short, URL-friendly paste id.
///
/// Ids are [`PASTE_ID_LEN`] ASCII alphanumerics. Collisions are not retried;
/// with 62^8 possibilities the store rejects the rare duplicate instead.
pub fn paste_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASTE_ID_LEN)
        .map(char::from)
        .collect()
}

fn random_bytes() -> [u8; TOKEN_BYTES] {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a session token: 256 random bits, URL-safe base64 encoded.
pub fn session_token() -> String {
    base64::engine::general_purpose::URL_SAFE.encode(random_bytes())
}

/// Generate an API key: [`API_KEY_PREFIX`] followed by 256 random bits in hex.
pub fn api_key_token() -> String {
    format!("{}{}", API_KEY_PREFIX, hex::encode(random_bytes()))
}

/// `true` when `value` has the shape of an issued API key.
pub fn looks_like_api_key(value: &str) -> bool {
    value
        .strip_prefix(API_KEY_PREFIX)
        .map(|rest| rest.len() == TOKEN_BYTES * 2 && rest.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
