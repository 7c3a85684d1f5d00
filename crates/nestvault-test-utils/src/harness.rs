// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end vault and rotation tests.
//!
//! `TestHarness` owns a temp SQLite database, a [`VaultService`], a
//! [`RotationCoordinator`] and the token store behind it, plus helpers that
//! play the identity service's part (registering users, changing passwords).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nestvault_core::{CategoryId, PasswordId, TokenStore, UserId, VaultError};
use nestvault_storage::queries::users;
use nestvault_storage::Database;
use nestvault_vault::kdf::generate_salt;
use nestvault_vault::{
    CredentialSecret, RotationCoordinator, RotationSettings, VaultService,
};
use secrecy::SecretString;

use crate::mock_token_store::FlakyTokenStore;

/// Builder for test environments.
pub struct TestHarnessBuilder {
    settings: RotationSettings,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: RotationSettings::default(),
        }
    }

    /// Override every rotation setting.
    pub fn with_settings(mut self, settings: RotationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.settings.chunk_size = chunk_size;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.settings.max_workers = max_workers;
        self
    }

    /// Build the harness on a fresh WAL-mode database file.
    pub async fn build(self) -> Result<TestHarness, VaultError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| VaultError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("vault.db");
        let db = Database::open_path(&db_path, true).await?;

        let tokens = FlakyTokenStore::new();
        let token_store: Arc<dyn TokenStore> = Arc::new(tokens.clone());
        let service = VaultService::new(db.clone());
        let coordinator = RotationCoordinator::new(db.clone(), token_store, self.settings);

        Ok(TestHarness {
            db,
            service,
            coordinator,
            tokens,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete vault stack over a throwaway database.
pub struct TestHarness {
    pub db: Database,
    pub service: VaultService,
    pub coordinator: RotationCoordinator,
    pub tokens: FlakyTokenStore,
    db_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default rotation settings.
    pub async fn new() -> Result<Self, VaultError> {
        Self::builder().build().await
    }

    /// Location of the database file, for tests that open a second connection.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Register a user with a fresh random salt.
    pub async fn add_user(&self, password_hash: &str) -> Result<UserId, VaultError> {
        let user = UserId(uuid::Uuid::now_v7());
        let salt = generate_salt()?;
        users::insert_user(&self.db, &user, password_hash, &salt).await?;
        Ok(user)
    }

    /// Register a user with a caller-chosen salt.
    pub async fn add_user_with_salt(
        &self,
        password_hash: &str,
        salt: &[u8],
    ) -> Result<UserId, VaultError> {
        let user = UserId(uuid::Uuid::now_v7());
        users::insert_user(&self.db, &user, password_hash, salt).await?;
        Ok(user)
    }

    /// Do what the identity service does on a verified password change:
    /// stash the old hash as a rotation token, then store the new hash.
    pub async fn change_password(
        &self,
        user: &UserId,
        old_hash: &str,
        new_hash: &str,
    ) -> Result<(), VaultError> {
        self.coordinator
            .stash_previous_secret(user, &SecretString::from(old_hash.to_string()))
            .await?;
        users::update_password_hash(&self.db, user, new_hash).await
    }

    /// Create a category named `name`.
    pub async fn add_category(&self, user: &UserId, name: &str) -> Result<CategoryId, VaultError> {
        Ok(self.service.create_category(user, name, "").await?.category_id)
    }

    /// Store `n` credentials with predictable contents (`site-i`, `user-i`, `pw-i`).
    pub async fn seed_credentials(
        &self,
        user: &UserId,
        category: &CategoryId,
        n: usize,
    ) -> Result<Vec<PasswordId>, VaultError> {
        let mut ids = Vec::with_capacity(n);
        for i in 0..n {
            let secret = CredentialSecret::new(format!("user-{i}"), format!("pw-{i}"), "");
            let id = self
                .service
                .create_credential(user, category, &format!("site-{i}"), &secret)
                .await?;
            ids.push(id);
        }
        Ok(ids)
    }
}
