//! User cascade deletion tests.

use super::*;

#[test]
fn delete_user_cascade_removes_everything_owned() {
    let (db, _temp) = setup_test_db();
    let now = epoch();
    let alice = add_user(&db, "alice").id;
    let bob = add_user(&db, "bobby").id;

    db.sessions
        .insert(&Session {
            token: "alice-session".to_string(),
            user_id: alice,
            created_at: now,
            expires_at: now + Duration::days(30),
        })
        .expect("session");
    db.api_keys
        .create(api_key::NewApiKey {
            key: "pb_alice".to_string(),
            name: "laptop".to_string(),
            user_id: alice,
            expires_at: None,
            created_at: now,
        })
        .expect("key");
    db.admins.grant(alice, now).expect("grant");
    db.pastes
        .create_deduplicated(build_paste("alice001", "mine", Some(alice), now), now)
        .expect("alice paste");
    db.pastes
        .create_deduplicated(build_paste("bob00001", "his", Some(bob), now), now)
        .expect("bob paste");

    let deletion = TransactionOps::delete_user_cascade(&db, alice, now).expect("cascade");
    assert_eq!(
        deletion,
        UserDeletion {
            sessions: 1,
            api_keys: 1,
            pastes: 1,
            was_admin: true,
        }
    );

    assert!(db.users.get(alice).expect("get").is_none());
    assert!(db.users.get_by_username("alice").expect("get").is_none());
    assert!(db.sessions.get("alice-session").expect("get").is_none());
    assert!(db.api_keys.get_by_token("pb_alice").expect("get").is_none());
    assert!(!db.admins.is_admin(alice).expect("is_admin"));

    let tombstoned = db.pastes.get("alice001").expect("get").expect("row kept");
    assert_eq!(tombstoned.deleted_at, Some(now));
    assert!(db.pastes.list_by_owner(alice).expect("list").is_empty());

    let untouched = db.pastes.get("bob00001").expect("get").expect("bob row");
    assert!(untouched.deleted_at.is_none());
}

#[test]
fn delete_user_cascade_missing_user_is_not_found() {
    let (db, _temp) = setup_test_db();
    let err = TransactionOps::delete_user_cascade(&db, UserId(77), epoch())
        .expect_err("missing user");
    assert!(matches!(err, AppError::NotFound));
}

#[test]
fn username_is_reusable_after_cascade() {
    let (db, _temp) = setup_test_db();
    let first = add_user(&db, "alice");
    TransactionOps::delete_user_cascade(&db, first.id, epoch()).expect("cascade");

    let second = add_user(&db, "alice");
    assert_ne!(first.id, second.id, "user ids are never reused");
}
