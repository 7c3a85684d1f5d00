// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end key rotation tests over a real database file.

use std::time::Duration;

use nestvault_core::{rotation_token_key, PageRequest, TokenStore, VaultError};
use nestvault_storage::queries::credentials;
use nestvault_test_utils::TestHarness;
use nestvault_vault::{cipher, CredentialSecret, DerivedKey, RotationSettings};
use tracing_test::traced_test;

const SALT: [u8; 16] = [0x5a; 16];

#[tokio::test]
async fn create_fetch_rotate_fetch() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user_with_salt("H1", &SALT).await.unwrap();
    let cat = h.add_category(&user, "web").await.unwrap();

    let secret = CredentialSecret::new("u", "p", "");
    let id = h
        .service
        .create_credential(&user, &cat, "example.com", &secret)
        .await
        .unwrap();
    let fetched = h.service.get_credential(&user, &cat, &id).await.unwrap();
    assert_eq!(fetched.website, "example.com");
    assert_eq!(fetched.secret, secret);

    h.change_password(&user, "H1", "H2").await.unwrap();
    h.coordinator.rotate(&user).await.unwrap();

    let fetched = h.service.get_credential(&user, &cat, &id).await.unwrap();
    assert_eq!(fetched.website, "example.com");
    assert_eq!(fetched.secret, secret);

    let raw = credentials::get_credential(&h.db, &user, &cat, &id).await.unwrap();
    let k1 = DerivedKey::derive(b"H1", &user, &SALT).unwrap();
    let k2 = DerivedKey::derive(b"H2", &user, &SALT).unwrap();
    assert_eq!(raw.key_id, k2.id());
    assert_eq!(cipher::decrypt(&raw.nonce, &raw.ciphertext, &k2).unwrap(), secret);
    assert!(matches!(
        cipher::decrypt(&raw.nonce, &raw.ciphertext, &k1),
        Err(VaultError::Integrity(_))
    ));
}

#[tokio::test]
async fn rotation_preserves_every_record_across_chunks() {
    let h = TestHarness::builder()
        .with_chunk_size(3)
        .with_max_workers(2)
        .build()
        .await
        .unwrap();
    let user = h.add_user("before").await.unwrap();
    let cat_a = h.add_category(&user, "a").await.unwrap();
    let cat_b = h.add_category(&user, "b").await.unwrap();
    h.seed_credentials(&user, &cat_a, 11).await.unwrap();
    h.seed_credentials(&user, &cat_b, 6).await.unwrap();

    let before: Vec<_> = credentials::list_all_credentials(&h.db, &user).await.unwrap();
    h.change_password(&user, "before", "after").await.unwrap();

    let report = h.coordinator.rotate(&user).await.unwrap();
    assert_eq!(report.migrated, 17);
    assert_eq!(report.already_current, 0);

    let after = credentials::list_all_credentials(&h.db, &user).await.unwrap();
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.password_id, new.password_id);
        assert_ne!(old.nonce, new.nonce, "rotation must use a fresh nonce");
        assert_ne!(old.key_id, new.key_id);
    }

    let all = h
        .service
        .list_credentials(&user, PageRequest::unbounded())
        .await
        .unwrap();
    assert_eq!(all.len(), 17);
    for c in &all {
        let i = c.website.trim_start_matches("site-");
        assert_eq!(c.secret.username, format!("user-{i}"));
        assert_eq!(c.secret.password, format!("pw-{i}"));
    }
}

#[tokio::test]
async fn rerun_with_live_token_is_idempotent() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("v1").await.unwrap();
    let cat = h.add_category(&user, "x").await.unwrap();
    h.seed_credentials(&user, &cat, 5).await.unwrap();
    h.change_password(&user, "v1", "v2").await.unwrap();

    // Keep the token so the second run is allowed.
    h.tokens.fail_deletes(true);
    let err = h.coordinator.rotate(&user).await.unwrap_err();
    assert!(matches!(err, VaultError::TokenStore { .. }));
    h.tokens.fail_deletes(false);

    let after_first = credentials::list_all_credentials(&h.db, &user).await.unwrap();
    let report = h.coordinator.rotate(&user).await.unwrap();
    assert_eq!(report.migrated, 0);
    assert_eq!(report.already_current, 5);

    let after_second = credentials::list_all_credentials(&h.db, &user).await.unwrap();
    assert_eq!(after_first, after_second, "second run must not rewrite records");
}

#[tokio::test]
#[traced_test]
async fn expired_token_is_rejected_without_changes() {
    let h = TestHarness::builder()
        .with_settings(RotationSettings {
            token_ttl: Duration::ZERO,
            ..RotationSettings::default()
        })
        .build()
        .await
        .unwrap();
    let user = h.add_user("old").await.unwrap();
    let cat = h.add_category(&user, "x").await.unwrap();
    h.seed_credentials(&user, &cat, 4).await.unwrap();
    let before = credentials::list_all_credentials(&h.db, &user).await.unwrap();

    h.change_password(&user, "old", "new").await.unwrap();
    let err = h.coordinator.rotate(&user).await.unwrap_err();
    assert!(matches!(err, VaultError::RotationWindowExpired { .. }));

    let after = credentials::list_all_credentials(&h.db, &user).await.unwrap();
    assert_eq!(before, after);
    assert!(!logs_contain("rotation starting"));
}

#[tokio::test]
async fn partial_rotation_is_visible_and_resumable() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("old").await.unwrap();
    let cat = h.add_category(&user, "x").await.unwrap();
    let ids = h.seed_credentials(&user, &cat, 6).await.unwrap();
    h.change_password(&user, "old", "new").await.unwrap();

    // Simulate a run that committed only some chunks: re-seal two records by hand.
    let old_key = DerivedKey::derive(b"old", &user, &salt_of(&h, &user).await).unwrap();
    let new_key = h.service.current_key(&user).await.unwrap();
    let mut moved = Vec::new();
    for id in &ids[..2] {
        let mut raw = credentials::get_credential(&h.db, &user, &cat, id).await.unwrap();
        let secret = cipher::decrypt(&raw.nonce, &raw.ciphertext, &old_key).unwrap();
        let sealed = cipher::encrypt(&secret, &new_key).unwrap();
        raw.nonce = sealed.nonce;
        raw.ciphertext = sealed.ciphertext;
        raw.key_id = sealed.key_id;
        moved.push(raw);
    }
    credentials::replace_chunk(&h.db, moved, old_key.id()).await.unwrap();

    let status = h.coordinator.rotation_status(&user).await.unwrap();
    assert_eq!((status.current, status.stale), (2, 4));
    assert!(status.token_pending);

    let stale = h.service.get_credential(&user, &cat, &ids[3]).await.unwrap_err();
    assert!(matches!(stale, VaultError::StaleKey { .. }));

    let report = h.coordinator.rotate(&user).await.unwrap();
    assert_eq!(report.migrated, 4);
    assert_eq!(report.already_current, 2);
    assert!(h.coordinator.rotation_status(&user).await.unwrap().is_complete());
}

#[tokio::test]
async fn chunks_stuck_on_a_locked_database_time_out_and_resume() {
    let h = TestHarness::builder()
        .with_settings(RotationSettings {
            chunk_size: 2,
            max_workers: 2,
            chunk_timeout: Duration::from_millis(300),
            ..RotationSettings::default()
        })
        .build()
        .await
        .unwrap();
    let user = h.add_user("old").await.unwrap();
    let cat = h.add_category(&user, "x").await.unwrap();
    h.seed_credentials(&user, &cat, 4).await.unwrap();
    h.change_password(&user, "old", "new").await.unwrap();

    // A second writer holds the write lock; reads still succeed under WAL,
    // but every chunk commit waits in the busy handler past its budget.
    let blocker = rusqlite::Connection::open(h.db_path()).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

    let err = h.coordinator.rotate(&user).await.unwrap_err();
    assert!(matches!(err, VaultError::RotationIncomplete { remaining: 4 }));
    assert!(!h.tokens.inner().is_empty(), "token must survive a timed-out run");

    blocker.execute_batch("ROLLBACK").unwrap();
    drop(blocker);

    let report = h.coordinator.rotate(&user).await.unwrap();
    assert_eq!(report.migrated + report.already_current, 4);
    assert!(h.coordinator.rotation_status(&user).await.unwrap().is_complete());
    assert!(h.tokens.inner().is_empty());

    let all = h
        .service
        .list_credentials(&user, PageRequest::unbounded())
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn token_read_failure_is_transient_and_touches_nothing() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("old").await.unwrap();
    let cat = h.add_category(&user, "x").await.unwrap();
    h.seed_credentials(&user, &cat, 2).await.unwrap();
    h.change_password(&user, "old", "new").await.unwrap();

    h.tokens.fail_reads(true);
    let err = h.coordinator.rotate(&user).await.unwrap_err();
    assert!(err.is_transient());
    h.tokens.fail_reads(false);

    let status = h.coordinator.rotation_status(&user).await.unwrap();
    assert_eq!(status.stale, 2);
}

#[tokio::test]
async fn token_uses_reset_key_and_base64_value() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("old").await.unwrap();
    h.change_password(&user, "old", "new").await.unwrap();

    let value = h
        .tokens
        .inner()
        .get(&rotation_token_key(&user))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value, "b2xk");
}

#[tokio::test]
async fn rotating_an_empty_vault_consumes_the_token() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("old").await.unwrap();
    h.change_password(&user, "old", "new").await.unwrap();

    let report = h.coordinator.rotate(&user).await.unwrap();
    assert_eq!(report, Default::default());
    assert!(h.tokens.inner().is_empty());
}

async fn salt_of(h: &TestHarness, user: &nestvault_core::UserId) -> Vec<u8> {
    nestvault_storage::queries::users::kdf_material(&h.db, user)
        .await
        .unwrap()
        .salt
}
