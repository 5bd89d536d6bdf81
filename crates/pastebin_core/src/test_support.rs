//! Shared test-only helpers for pastebin_core.

use crate::clock::ManualClock;
use crate::models::user::User;
use crate::{Database, Services};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

/// Creates an isolated temporary database and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation, path conversion, or database initialization
/// fails in the test environment.
pub(crate) fn setup_temp_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("test.redb");
    let db = Database::new(db_path.to_str().expect("db path")).expect("db");
    (db, temp_dir)
}

/// Fixed starting instant for time-travel tests.
pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Services over a temp database with a hand-driven clock.
pub(crate) struct Harness {
    pub services: Services,
    pub db: Arc<Database>,
    pub clock: Arc<ManualClock>,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let (db, dir) = setup_temp_db();
        let db = Arc::new(db);
        let clock = Arc::new(ManualClock::new(epoch()));
        let services = Services::new(db.clone(), clock.clone());
        Self {
            services,
            db,
            clock,
            _dir: dir,
        }
    }

    /// Register a user with a valid password.
    pub fn user(&self, name: &str) -> User {
        self.services
            .auth
            .register(name, "hunter2x")
            .expect("register user")
    }
}
