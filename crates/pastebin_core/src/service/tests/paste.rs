//! Paste service tests.

use super::*;
use crate::constants::MAX_PASTE_SIZE;

#[test]
fn fingerprint_is_deterministic_and_distinct() {
    let a = crate::hash::fingerprint(b"hello");
    assert_eq!(a, crate::hash::fingerprint(b"hello"));
    assert_ne!(a, crate::hash::fingerprint(b"hello!"));
    assert_eq!(a.len(), 64);
}

#[test]
fn same_scope_dedups_and_different_scopes_do_not() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let pastes = &h.services.pastes;

    let anon_a = pastes.create(NewPaste::text("dup", None)).expect("anon");
    let anon_b = pastes.create(NewPaste::text("dup", None)).expect("anon again");
    assert!(anon_a.is_created());
    assert!(!anon_b.is_created());
    assert_eq!(anon_a.paste().id, anon_b.paste().id);

    let owned = pastes
        .create(NewPaste::text("dup", Some(alice)))
        .expect("alice");
    assert!(owned.is_created());
    assert_ne!(owned.paste().id, anon_a.paste().id);
}

#[test]
fn dedup_hit_returns_existing_row_unchanged() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let first = h
        .services
        .pastes
        .create(NewPaste {
            title: "original".to_string(),
            content: "x".to_string(),
            owner: Some(alice),
            ..NewPaste::default()
        })
        .expect("first")
        .into_paste();

    let second = h
        .services
        .pastes
        .create(NewPaste {
            title: "different title".to_string(),
            content: "x".to_string(),
            unlisted: true,
            owner: Some(alice),
            ..NewPaste::default()
        })
        .expect("second")
        .into_paste();
    assert_eq!(second, first);
}

#[test]
fn content_size_limits() {
    let h = Harness::new();
    let pastes = &h.services.pastes;

    assert!(matches!(
        pastes.create(NewPaste::text("", None)),
        Err(AppError::Validation(_))
    ));

    let exact = "a".repeat(MAX_PASTE_SIZE);
    assert!(pastes.create(NewPaste::text(exact, None)).is_ok());

    let oversized = "a".repeat(11 * 1024 * 1024);
    assert!(matches!(
        pastes.create(NewPaste::text(oversized, None)),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn anonymous_private_paste_is_rejected() {
    let h = Harness::new();
    let err = h
        .services
        .pastes
        .create(NewPaste {
            content: "secret".to_string(),
            is_private: true,
            ..NewPaste::default()
        })
        .expect_err("anonymous private");
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn blank_language_defaults_to_text() {
    let h = Harness::new();
    let paste = h
        .services
        .pastes
        .create(NewPaste {
            content: "fn main() {}".to_string(),
            language: "  ".to_string(),
            ..NewPaste::default()
        })
        .expect("create")
        .into_paste();
    assert_eq!(paste.language, "text");
}

#[test]
fn expired_paste_is_not_found_before_sweep() {
    let h = Harness::new();
    let paste = h
        .services
        .pastes
        .create(NewPaste {
            content: "brief".to_string(),
            expires_in_minutes: Some(10),
            ..NewPaste::default()
        })
        .expect("create")
        .into_paste();

    assert!(h.services.pastes.get(&paste.id, None).is_ok());
    h.clock.advance(Duration::minutes(11));
    assert!(matches!(
        h.services.pastes.get(&paste.id, None),
        Err(AppError::NotFound)
    ));
    assert!(h.db.pastes.get(&paste.id).expect("raw get").is_some());
}

#[test]
fn private_paste_is_not_found_for_non_owners() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let bob = h.user("bobby").id;
    let paste = h
        .services
        .pastes
        .create(NewPaste {
            content: "secret".to_string(),
            is_private: true,
            owner: Some(alice),
            ..NewPaste::default()
        })
        .expect("create")
        .into_paste();

    for viewer in [None, Some(bob)] {
        assert!(matches!(
            h.services.pastes.get(&paste.id, viewer),
            Err(AppError::NotFound)
        ));
    }
    assert!(h.services.pastes.get(&paste.id, Some(alice)).is_ok());
}

#[test]
fn list_public_excludes_private_unlisted_deleted_and_expired() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let pastes = &h.services.pastes;
    let create = |content: &str, is_private: bool, unlisted: bool, minutes: Option<i64>| {
        pastes
            .create(NewPaste {
                content: content.to_string(),
                is_private,
                unlisted,
                expires_in_minutes: minutes,
                owner: Some(alice),
                ..NewPaste::default()
            })
            .expect("create")
            .into_paste()
    };

    let public = create("public", false, false, None);
    create("private", true, false, None);
    create("unlisted", false, true, None);
    create("short", false, false, Some(1));
    let removed = create("removed", false, false, None);
    pastes.delete(&removed.id, alice).expect("delete");

    h.clock.advance(Duration::minutes(2));
    let listed = pastes.list_public().expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, public.id);
}

#[test]
fn lists_are_newest_first() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let mut ids = Vec::new();
    for content in ["one", "two", "three"] {
        ids.push(
            h.services
                .pastes
                .create(NewPaste::text(content, Some(alice)))
                .expect("create")
                .into_paste()
                .id,
        );
        h.clock.advance(Duration::seconds(1));
    }
    ids.reverse();

    let owned: Vec<String> = h
        .services
        .pastes
        .list_owned(alice)
        .expect("owned")
        .into_iter()
        .map(|paste| paste.id)
        .collect();
    let public: Vec<String> = h
        .services
        .pastes
        .list_public()
        .expect("public")
        .into_iter()
        .map(|paste| paste.id)
        .collect();
    assert_eq!(owned, ids);
    assert_eq!(public, ids);
}

#[test]
fn list_owned_includes_private_but_not_deleted() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let pastes = &h.services.pastes;
    pastes
        .create(NewPaste {
            content: "private".to_string(),
            is_private: true,
            owner: Some(alice),
            ..NewPaste::default()
        })
        .expect("private");
    let gone = pastes
        .create(NewPaste::text("gone", Some(alice)))
        .expect("gone")
        .into_paste();
    pastes.delete(&gone.id, alice).expect("delete");

    let owned = pastes.list_owned(alice).expect("owned");
    assert_eq!(owned.len(), 1);
    assert!(owned[0].is_private);
}

#[test]
fn update_replaces_editable_fields_and_fingerprint() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let original = h
        .services
        .pastes
        .create(NewPaste {
            title: "v1".to_string(),
            content: "first".to_string(),
            is_private: true,
            expires_in_minutes: Some(60),
            owner: Some(alice),
            ..NewPaste::default()
        })
        .expect("create")
        .into_paste();

    h.clock.advance(Duration::seconds(5));
    let updated = h
        .services
        .pastes
        .update(
            &original.id,
            PasteUpdate {
                title: "v2".to_string(),
                content: "second".to_string(),
                language: "rust".to_string(),
                unlisted: true,
            },
            alice,
        )
        .expect("update");

    assert_eq!(updated.title, "v2");
    assert_eq!(updated.content, "second");
    assert_eq!(updated.fingerprint, crate::hash::fingerprint(b"second"));
    assert_eq!(updated.language, "rust");
    assert!(updated.unlisted);
    assert!(updated.updated_at > original.updated_at);
    assert!(updated.is_private, "privacy is not editable");
    assert_eq!(updated.expires_at, original.expires_at);

    // The new content now dedups to this paste; the old content no longer does.
    let again = h
        .services
        .pastes
        .create(NewPaste::text("second", Some(alice)))
        .expect("dedup");
    assert_eq!(again.paste().id, original.id);
    let fresh = h
        .services
        .pastes
        .create(NewPaste::text("first", Some(alice)))
        .expect("fresh");
    assert!(fresh.is_created());
}

#[test]
fn non_owner_update_and_delete_fail_without_mutation() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let bob = h.user("bobby").id;
    let paste = h
        .services
        .pastes
        .create(NewPaste::text("alice's", Some(alice)))
        .expect("create")
        .into_paste();

    let update = PasteUpdate {
        content: "bob was here".to_string(),
        ..PasteUpdate::default()
    };
    assert!(matches!(
        h.services.pastes.update(&paste.id, update, bob),
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.services.pastes.delete(&paste.id, bob),
        Err(AppError::Forbidden(_))
    ));

    let stored = h.db.pastes.get(&paste.id).expect("get").expect("paste");
    assert_eq!(stored, paste);
}

#[test]
fn anonymous_paste_cannot_be_edited_by_anyone() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let paste = h
        .services
        .pastes
        .create(NewPaste::text("anon", None))
        .expect("create")
        .into_paste();
    assert!(!h.services.pastes.can_edit(&paste.id, alice));
    assert!(matches!(
        h.services.pastes.delete(&paste.id, alice),
        Err(AppError::Forbidden(_))
    ));
}

#[test]
fn update_and_delete_of_missing_or_deleted_are_not_found() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let pastes = &h.services.pastes;
    let update = || PasteUpdate {
        content: "new".to_string(),
        ..PasteUpdate::default()
    };

    assert!(matches!(
        pastes.update("nope0000", update(), alice),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        pastes.delete("nope0000", alice),
        Err(AppError::NotFound)
    ));

    let paste = pastes
        .create(NewPaste::text("bye", Some(alice)))
        .expect("create")
        .into_paste();
    pastes.delete(&paste.id, alice).expect("delete");
    assert!(matches!(pastes.get(&paste.id, Some(alice)), Err(AppError::NotFound)));
    assert!(matches!(pastes.delete(&paste.id, alice), Err(AppError::NotFound)));
    assert!(matches!(
        pastes.update(&paste.id, update(), alice),
        Err(AppError::NotFound)
    ));
}

#[test]
fn update_rejects_empty_content() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let paste = h
        .services
        .pastes
        .create(NewPaste::text("keep", Some(alice)))
        .expect("create")
        .into_paste();
    assert!(matches!(
        h.services
            .pastes
            .update(&paste.id, PasteUpdate::default(), alice),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn search_is_case_sensitive_and_owner_scoped() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let bob = h.user("bobby").id;
    let pastes = &h.services.pastes;
    pastes
        .create(NewPaste {
            title: "Notes".to_string(),
            content: "alpha".to_string(),
            owner: Some(alice),
            ..NewPaste::default()
        })
        .expect("alice notes");
    pastes
        .create(NewPaste::text("Notes from bob", Some(bob)))
        .expect("bob notes");

    assert_eq!(pastes.search(alice, "Notes").expect("search").len(), 1);
    assert!(pastes.search(alice, "notes").expect("search").is_empty());
    assert_eq!(pastes.search(alice, "alph").expect("search").len(), 1);
    assert!(matches!(pastes.search(alice, ""), Err(AppError::Validation(_))));
}

#[test]
fn can_edit_requires_live_owned_paste() {
    let h = Harness::new();
    let alice = h.user("alice").id;
    let bob = h.user("bobby").id;
    let paste = h
        .services
        .pastes
        .create(NewPaste {
            content: "mine".to_string(),
            expires_in_minutes: Some(5),
            owner: Some(alice),
            ..NewPaste::default()
        })
        .expect("create")
        .into_paste();

    assert!(h.services.pastes.can_edit(&paste.id, alice));
    assert!(!h.services.pastes.can_edit(&paste.id, bob));
    assert!(!h.services.pastes.can_edit("missing0", alice));
    h.clock.advance(Duration::minutes(6));
    assert!(!h.services.pastes.can_edit(&paste.id, alice));
}

#[test]
fn expire_sweep_is_idempotent() {
    let h = Harness::new();
    for (content, minutes) in [("a", Some(1)), ("b", Some(2)), ("c", None)] {
        h.services
            .pastes
            .create(NewPaste {
                content: content.to_string(),
                expires_in_minutes: minutes,
                ..NewPaste::default()
            })
            .expect("create");
    }

    assert_eq!(h.services.pastes.expire_sweep().expect("sweep"), 0);
    h.clock.advance(Duration::minutes(3));
    assert_eq!(h.services.pastes.expire_sweep().expect("sweep"), 2);
    assert_eq!(h.services.pastes.expire_sweep().expect("sweep"), 0);
    assert_eq!(h.services.pastes.list_public().expect("list").len(), 1);
}
