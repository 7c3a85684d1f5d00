// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end credential and category tests over a real database file.

use nestvault_core::{CategoryKey, PageRequest, PasswordId, VaultError};
use nestvault_test_utils::TestHarness;
use nestvault_vault::CredentialSecret;

#[tokio::test]
async fn update_reseals_with_new_contents() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("hash").await.unwrap();
    let cat = h.add_category(&user, "mail").await.unwrap();
    let id = h
        .service
        .create_credential(&user, &cat, "mail.example", &CredentialSecret::new("a", "1", ""))
        .await
        .unwrap();

    let updated = CredentialSecret::new("a", "2", "rotated by hand");
    h.service
        .update_credential(&user, &cat, &id, "mail.example.org", &updated)
        .await
        .unwrap();

    let fetched = h.service.get_credential(&user, &cat, &id).await.unwrap();
    assert_eq!(fetched.website, "mail.example.org");
    assert_eq!(fetched.secret, updated);
}

#[tokio::test]
async fn pagination_visits_each_credential_once() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("hash").await.unwrap();
    let cat = h.add_category(&user, "bulk").await.unwrap();
    let mut expected = h.seed_credentials(&user, &cat, 9).await.unwrap();

    let mut seen: Vec<PasswordId> = Vec::new();
    let mut page = PageRequest::first(4);
    loop {
        let batch = h.service.list_credentials(&user, page).await.unwrap();
        let Some(last) = batch.last() else { break };
        page = PageRequest::after(last.password_id, 4);
        seen.extend(batch.iter().map(|c| c.password_id));
        // A write between pages must not disturb the remaining pages.
        if seen.len() == 4 {
            expected.extend(h.seed_credentials(&user, &cat, 1).await.unwrap());
        }
    }
    expected.sort();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn listing_by_category_is_scoped() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("hash").await.unwrap();
    let work = h.add_category(&user, "work").await.unwrap();
    let home = h.add_category(&user, "home").await.unwrap();
    h.seed_credentials(&user, &work, 3).await.unwrap();
    h.seed_credentials(&user, &home, 2).await.unwrap();

    let in_home = h
        .service
        .list_credentials_by_category(&user, &home, PageRequest::unbounded())
        .await
        .unwrap();
    assert_eq!(in_home.len(), 2);
    assert!(in_home.iter().all(|c| c.category_id == home));
}

#[tokio::test]
async fn deleting_category_removes_its_credentials() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("hash").await.unwrap();
    let doomed = h.add_category(&user, "old-job").await.unwrap();
    let kept = h.add_category(&user, "personal").await.unwrap();
    let doomed_ids = h.seed_credentials(&user, &doomed, 4).await.unwrap();
    h.seed_credentials(&user, &kept, 1).await.unwrap();

    assert_eq!(h.service.delete_category(&user, &doomed).await.unwrap(), 4);

    let err = h
        .service
        .get_credential(&user, &doomed, &doomed_ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));
    let left = h
        .service
        .list_credentials(&user, PageRequest::unbounded())
        .await
        .unwrap();
    assert_eq!(left.len(), 1);

    let err = h
        .service
        .get_category(&user, &CategoryKey::Id(doomed))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::NotFound { entity: "category" }));
}

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("hash").await.unwrap();
    h.add_category(&user, "banking").await.unwrap();
    let err = h.add_category(&user, "banking").await.unwrap_err();
    assert!(matches!(err, VaultError::Conflict(_)));
}

#[tokio::test]
async fn other_tenant_cannot_reach_credentials() {
    let h = TestHarness::new().await.unwrap();
    let alice = h.add_user("alice-hash").await.unwrap();
    let bob = h.add_user("bob-hash").await.unwrap();
    let cat = h.add_category(&alice, "secret").await.unwrap();
    let id = h
        .service
        .create_credential(&alice, &cat, "bank", &CredentialSecret::new("alice", "pw", ""))
        .await
        .unwrap();

    let read = h.service.get_credential(&bob, &cat, &id).await.unwrap_err();
    assert!(matches!(read, VaultError::NotFound { .. }));

    let write = h
        .service
        .update_credential(&bob, &cat, &id, "bank", &CredentialSecret::new("bob", "x", ""))
        .await
        .unwrap_err();
    assert!(matches!(write, VaultError::NotFound { .. }));

    let delete = h.service.delete_credential(&bob, &cat, &id).await.unwrap_err();
    assert!(matches!(delete, VaultError::NotFound { .. }));

    let insert = h
        .service
        .create_credential(&bob, &cat, "planted", &CredentialSecret::new("bob", "x", ""))
        .await
        .unwrap_err();
    assert!(matches!(insert, VaultError::NotFound { .. }));

    let intact = h.service.get_credential(&alice, &cat, &id).await.unwrap();
    assert_eq!(intact.secret.username, "alice");
}

#[tokio::test]
async fn unknown_user_has_no_kdf_material() {
    let h = TestHarness::new().await.unwrap();
    let ghost = nestvault_core::UserId(uuid::Uuid::now_v7());
    let err = h
        .service
        .list_credentials(&ghost, PageRequest::unbounded())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::NotFound { entity: "KDF material" }));
}

#[tokio::test]
async fn concurrent_writers_all_land() {
    let h = TestHarness::new().await.unwrap();
    let user = h.add_user("hash").await.unwrap();
    let cat = h.add_category(&user, "parallel").await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let service = h.service.clone();
        tasks.spawn(async move {
            service
                .create_credential(
                    &user,
                    &cat,
                    &format!("site-{i}"),
                    &CredentialSecret::new("u", format!("p{i}"), ""),
                )
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let all = h
        .service
        .list_credentials(&user, PageRequest::unbounded())
        .await
        .unwrap();
    assert_eq!(all.len(), 16);
}
