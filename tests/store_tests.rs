//! Repository-level tests over an in-memory store, covering the
//! transactional outcomes the HTTP layer builds on.

use chrono::Duration;
use reserva::db::{ConsumeOutcome, CreateOutcome, DemoteOutcome, NewUser, Store};

async fn store() -> Store {
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("failed to open in-memory store")
}

fn new_user(username: &str, email: &str, is_superuser: bool) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: "hunter2hunter2".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        is_superuser,
        is_staff: is_superuser,
        can_revoke_admins: true,
        memorable_information: String::new(),
    }
}

#[tokio::test]
async fn seeded_admin_uses_the_fixed_width_timestamp_format() {
    let store = store().await;

    // Migration-seeded rows must sort with repository-written ones, so the
    // seed shares the micros + Z format: 2026-01-02T03:04:05.678901Z
    let admin = store.users().get_by_id(1).await.unwrap().unwrap();
    assert_eq!(admin.username, "admin");
    for ts in [&admin.created_at, &admin.updated_at] {
        assert_eq!(ts.len(), 27, "unexpected timestamp shape: {ts}");
        assert!(ts.ends_with('Z'));
    }
}

#[tokio::test]
async fn create_with_profile_reports_duplicates() {
    let store = store().await;

    let outcome = store
        .users()
        .create_with_profile(new_user("alice", "alice@example.com", false))
        .await
        .unwrap();
    let user = match outcome {
        CreateOutcome::Created(user) => user,
        _ => panic!("expected creation"),
    };
    assert!(user.is_active);

    // The profile was created in the same transaction.
    let profile = store.users().get_profile(user.id).await.unwrap().unwrap();
    assert!(profile.can_revoke_admins);

    let outcome = store
        .users()
        .create_with_profile(new_user("alice", "other@example.com", false))
        .await
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::DuplicateUsername));

    let outcome = store
        .users()
        .create_with_profile(new_user("alice2", "alice@example.com", false))
        .await
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::DuplicateEmail));
}

#[tokio::test]
async fn demote_superuser_outcomes() {
    let store = store().await;

    let CreateOutcome::Created(admin) = store
        .users()
        .create_with_profile(new_user("boss", "boss@example.com", true))
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };
    let CreateOutcome::Created(pleb) = store
        .users()
        .create_with_profile(new_user("pleb", "pleb@example.com", false))
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };

    assert_eq!(
        store.users().demote_superuser(9999).await.unwrap(),
        DemoteOutcome::NotFound
    );
    assert_eq!(
        store.users().demote_superuser(pleb.id).await.unwrap(),
        DemoteOutcome::NotAdmin
    );
    assert_eq!(
        store.users().demote_superuser(admin.id).await.unwrap(),
        DemoteOutcome::Demoted("boss".to_string())
    );

    // The flags really are gone; a repeat demotion sees a non-admin.
    let reread = store.users().get_by_id(admin.id).await.unwrap().unwrap();
    assert!(!reread.is_superuser);
    assert!(!reread.is_staff);
    assert_eq!(
        store.users().demote_superuser(admin.id).await.unwrap(),
        DemoteOutcome::NotAdmin
    );
}

#[tokio::test]
async fn expired_token_cannot_be_consumed() {
    let store = store().await;

    let CreateOutcome::Created(user) = store
        .users()
        .create_with_profile(new_user("carol", "carol@example.com", false))
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };

    // Backdated expiry makes the token stale on arrival.
    store
        .tokens()
        .create(user.id, "stale-token", Duration::hours(-1))
        .await
        .unwrap();

    let outcome = store
        .tokens()
        .consume("stale-token", "replacement-password")
        .await
        .unwrap();
    assert!(matches!(outcome, ConsumeOutcome::Invalid));

    // The stored hash is untouched and the token row survives, still unused.
    let reread = store.users().get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(reread.password_hash, user.password_hash);
    let token = store
        .tokens()
        .get_by_token("stale-token")
        .await
        .unwrap()
        .unwrap();
    assert!(!token.is_used);
}

#[tokio::test]
async fn consume_rotates_hash_and_burns_token() {
    let store = store().await;

    let CreateOutcome::Created(user) = store
        .users()
        .create_with_profile(new_user("dave", "dave@example.com", false))
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };

    store
        .tokens()
        .create(user.id, "fresh-token", Duration::hours(1))
        .await
        .unwrap();

    let outcome = store
        .tokens()
        .consume("fresh-token", "replacement-password")
        .await
        .unwrap();
    assert!(matches!(outcome, ConsumeOutcome::Consumed));

    let reread = store.users().get_by_id(user.id).await.unwrap().unwrap();
    assert_ne!(reread.password_hash, user.password_hash);

    let token = store
        .tokens()
        .get_by_token("fresh-token")
        .await
        .unwrap()
        .unwrap();
    assert!(token.is_used);

    assert!(matches!(
        store
            .tokens()
            .consume("fresh-token", "another-password")
            .await
            .unwrap(),
        ConsumeOutcome::Invalid
    ));
    assert!(matches!(
        store
            .tokens()
            .consume("never-issued", "another-password")
            .await
            .unwrap(),
        ConsumeOutcome::NotFound
    ));
}

#[tokio::test]
async fn attempt_window_counts_only_recent_rows() {
    let store = store().await;
    let now = chrono::Utc::now();

    store.attempts().record("x@example.com").await.unwrap();
    store.attempts().record("x@example.com").await.unwrap();
    store.attempts().record("y@example.com").await.unwrap();

    let window = store
        .attempts()
        .window("x@example.com", now - Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(window.count, 2);
    assert!(window.oldest.is_some());

    // A window starting in the future sees nothing.
    let window = store
        .attempts()
        .window("x@example.com", now + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(window.count, 0);
    assert!(window.oldest.is_none());

    // Purging with a future cutoff clears everything.
    let purged = store
        .attempts()
        .purge_older_than(now + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(purged, 3);
}
