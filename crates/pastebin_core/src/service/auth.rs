//! Registration, login and session lifecycle.

use crate::clock::Clock;
use crate::constants::{PASSWORD_MIN_LEN, SESSION_TTL_DAYS, USERNAME_MAX_LEN, USERNAME_MIN_LEN};
use crate::db::Database;
use crate::error::AppError;
use crate::models::user::{Session, User, UserId};
use crate::tokens;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Duration;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

const INVALID_CREDENTIALS: &str = "invalid username or password";
const INVALID_SESSION: &str = "invalid or expired session";

/// Account and session operations.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::PasswordHash(err.to_string()))
}

pub(crate) fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored).map_err(|err| AppError::PasswordHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash checked when the username is unknown, so both login failures pay for
/// one Argon2 verification.
pub(crate) fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| match hash_password("pastebin-dummy-password") {
            Ok(hash) => Some(hash),
            Err(err) => {
                warn!("dummy password hash unavailable: {}", err);
                None
            }
        })
        .as_deref()
}

impl AuthService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Create an account. Only the Argon2id hash of `password` is stored.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for a bad username length, a short
    /// password, or a taken username.
    pub fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        let name_len = username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&name_len) {
            return Err(AppError::validation(format!(
                "username must be between {} and {} characters",
                USERNAME_MIN_LEN, USERNAME_MAX_LEN
            )));
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {} characters",
                PASSWORD_MIN_LEN
            )));
        }

        let password_hash = hash_password(password)?;
        let user = self
            .db
            .users
            .create(username, password_hash, self.clock.now())?;
        info!(user = user.id.0, username = %user.username, "user registered");
        Ok(user)
    }

    /// Check credentials. Unknown user and wrong password fail identically.
    ///
    /// # Errors
    /// Returns [`AppError::Unauthorized`] on bad credentials.
    pub fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.db.users.get_by_username(username)? else {
            if let Some(hash) = dummy_hash() {
                let _ = verify_password(password, hash);
            }
            debug!("login rejected: unknown username");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !verify_password(password, &user.password_hash)? {
            debug!(user = user.id.0, "login rejected: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        Ok(user)
    }

    /// Issue a fresh session valid for 30 days. Other sessions are untouched.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user does not exist.
    pub fn create_session(&self, user: UserId) -> Result<Session, AppError> {
        let now = self.clock.now();
        let session = Session {
            token: tokens::session_token(),
            user_id: user,
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };
        self.db.sessions.insert(&session)?;
        Ok(session)
    }

    /// # Errors
    /// Returns [`AppError::Unauthorized`] when the token is unknown or expired.
    pub fn get_session(&self, token: &str) -> Result<Session, AppError> {
        match self.db.sessions.get(token)? {
            Some(session) if !session.is_expired(self.clock.now()) => Ok(session),
            _ => Err(AppError::Unauthorized(INVALID_SESSION.to_string())),
        }
    }

    /// Remove a session. Absent tokens are not an error.
    ///
    /// # Errors
    /// Returns a storage error when the delete fails.
    pub fn delete_session(&self, token: &str) -> Result<(), AppError> {
        self.db.sessions.delete(token)?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// # Errors
    /// Returns [`AppError::Unauthorized`] when the session is invalid or its
    /// user no longer exists.
    pub fn resolve_session_user(&self, token: &str) -> Result<User, AppError> {
        let session = self.get_session(token)?;
        self.db
            .users
            .get(session.user_id)?
            .ok_or_else(|| AppError::Unauthorized(INVALID_SESSION.to_string()))
    }

    /// Purge expired sessions.
    ///
    /// # Returns
    /// Number of sessions removed.
    ///
    /// # Errors
    /// Returns a storage error when the purge fails.
    pub fn expire_sweep(&self) -> Result<usize, AppError> {
        let removed = self.db.sessions.purge_expired(self.clock.now())?;
        if removed > 0 {
            info!(removed, "expired sessions purged");
        }
        Ok(removed)
    }
}
