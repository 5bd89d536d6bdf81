//! Database integration tests.

use super::*;
use crate::error::AppError;
use crate::models::{paste::*, user::*};
use crate::test_support::epoch;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn setup_test_db() -> (Database, TempDir) {
    crate::test_support::setup_temp_db()
}

fn build_paste(id: &str, content: &str, owner: Option<UserId>, now: DateTime<Utc>) -> Paste {
    NewPaste::text(content, owner).into_paste(
        id.to_string(),
        crate::hash::fingerprint(content.as_bytes()),
        "text".to_string(),
        now,
    )
}

fn add_user(db: &Database, name: &str) -> User {
    db.users
        .create(name, "$argon2id$placeholder".to_string(), epoch())
        .expect("create user")
}

mod cascade;
