//! Unit tests for paste storage operations.

use super::{CreateOutcome, PasteDb};
use crate::models::paste::{NewPaste, Paste};
use crate::models::user::UserId;
use crate::test_support::epoch;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

fn setup_paste_db() -> (PasteDb, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("pastes.redb");
    let db = Arc::new(redb::Database::create(db_path).expect("open redb"));
    let paste_db = PasteDb::new(db).expect("open paste db");
    (paste_db, dir)
}

fn paste(id: &str, content: &str, owner: Option<UserId>, now: DateTime<Utc>) -> Paste {
    NewPaste::text(content, owner).into_paste(
        id.to_string(),
        crate::hash::fingerprint(content.as_bytes()),
        "text".to_string(),
        now,
    )
}

#[test]
fn soft_deleted_paste_never_satisfies_dedup() {
    let (paste_db, _dir) = setup_paste_db();
    let now = epoch();
    paste_db
        .create_deduplicated(paste("first001", "body", None, now), now)
        .expect("create");
    paste_db
        .update_with("first001", |paste| {
            paste.deleted_at = Some(now);
            Ok(())
        })
        .expect("tombstone")
        .expect("exists");

    let outcome = paste_db
        .create_deduplicated(paste("second01", "body", None, now), now)
        .expect("create again");
    assert!(matches!(outcome, CreateOutcome::Created(ref p) if p.id == "second01"));
}

#[test]
fn expired_paste_never_satisfies_dedup() {
    let (paste_db, _dir) = setup_paste_db();
    let now = epoch();
    let mut short = paste("short001", "body", None, now);
    short.expires_at = Some(now + Duration::minutes(1));
    paste_db.create_deduplicated(short, now).expect("create");

    let later = now + Duration::minutes(2);
    let outcome = paste_db
        .create_deduplicated(paste("fresh001", "body", None, later), later)
        .expect("create after expiry");
    assert!(outcome.is_created());

    let again = paste_db
        .create_deduplicated(paste("fresh002", "body", None, later), later)
        .expect("create duplicate");
    assert_eq!(again.paste().id, "fresh001");
}

#[test]
fn purge_includes_expired_tombstones() {
    let (paste_db, _dir) = setup_paste_db();
    let now = epoch();
    let mut doomed = paste("doomed01", "body", Some(UserId(1)), now);
    doomed.expires_at = Some(now + Duration::minutes(1));
    doomed.deleted_at = Some(now);
    paste_db.create_deduplicated(doomed, now).expect("create");

    assert_eq!(
        paste_db
            .purge_expired(now + Duration::minutes(2))
            .expect("purge"),
        1
    );
    assert!(paste_db.get("doomed01").expect("get").is_none());
}
