// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential and category operations for an authenticated user.
//!
//! Every call derives the user's current key from the stored KDF material,
//! so a password change takes effect immediately. Records still sealed under
//! an earlier key surface as [`VaultError::StaleKey`] until rotated.

use nestvault_core::{CategoryId, CategoryKey, PageRequest, PasswordId, UserId, VaultError};
use nestvault_storage::queries::{categories, credentials, users};
use nestvault_storage::{Category, CredentialRecord, Database};
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use crate::cipher::{self, CredentialSecret};
use crate::keys::DerivedKey;

/// A decrypted credential as handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub password_id: PasswordId,
    pub category_id: CategoryId,
    pub website: String,
    pub secret: CredentialSecret,
}

/// Per-user vault operations over an injected database handle.
#[derive(Clone)]
pub struct VaultService {
    db: Database,
}

impl VaultService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Derive the key for the user's current password hash.
    pub async fn current_key(&self, user_id: &UserId) -> Result<DerivedKey, VaultError> {
        let material = users::kdf_material(&self.db, user_id).await?;
        if material.password_hash.expose_secret().is_empty() {
            return Err(VaultError::InvalidInput(
                "password-derived secret must not be empty".to_string(),
            ));
        }
        DerivedKey::derive_blocking(material.password_hash, *user_id, material.salt).await
    }

    fn open_record(
        &self,
        record: CredentialRecord,
        key: &DerivedKey,
    ) -> Result<Credential, VaultError> {
        if record.key_id != key.id() {
            warn!(
                user_id = %record.user_id,
                password_id = %record.password_id,
                key_id = %record.key_id,
                "credential sealed under a previous key"
            );
            return Err(VaultError::StaleKey {
                password_id: record.password_id.to_string(),
            });
        }
        match cipher::decrypt(&record.nonce, &record.ciphertext, key) {
            Ok(secret) => Ok(Credential {
                password_id: record.password_id,
                category_id: record.category_id,
                website: record.website,
                secret,
            }),
            Err(e) => {
                error!(
                    user_id = %record.user_id,
                    password_id = %record.password_id,
                    error = %e,
                    "credential failed integrity check"
                );
                Err(e)
            }
        }
    }

    fn open_all(
        &self,
        records: Vec<CredentialRecord>,
        key: &DerivedKey,
    ) -> Result<Vec<Credential>, VaultError> {
        records
            .into_iter()
            .map(|record| self.open_record(record, key))
            .collect()
    }

    /// Encrypt and store a new credential. Returns its id.
    pub async fn create_credential(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        website: &str,
        secret: &CredentialSecret,
    ) -> Result<PasswordId, VaultError> {
        validate_website(website)?;
        validate_secret(secret)?;
        let key = self.current_key(user_id).await?;
        let sealed = cipher::encrypt(secret, &key)?;
        let record = CredentialRecord {
            password_id: PasswordId::generate(),
            user_id: *user_id,
            category_id: *category_id,
            website: website.to_string(),
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
            key_id: sealed.key_id,
        };
        credentials::insert_credential(&self.db, &record).await?;
        debug!(user_id = %user_id, password_id = %record.password_id, "credential created");
        Ok(record.password_id)
    }

    /// Fetch and decrypt one credential.
    pub async fn get_credential(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        password_id: &PasswordId,
    ) -> Result<Credential, VaultError> {
        let key = self.current_key(user_id).await?;
        let record =
            credentials::get_credential(&self.db, user_id, category_id, password_id).await?;
        self.open_record(record, &key)
    }

    /// One decrypted page of the user's credentials.
    pub async fn list_credentials(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Vec<Credential>, VaultError> {
        page.validate()?;
        let key = self.current_key(user_id).await?;
        let records = credentials::list_credentials(&self.db, user_id, page).await?;
        self.open_all(records, &key)
    }

    /// One decrypted page of the credentials in a category.
    pub async fn list_credentials_by_category(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        page: PageRequest,
    ) -> Result<Vec<Credential>, VaultError> {
        page.validate()?;
        let key = self.current_key(user_id).await?;
        let records =
            credentials::list_credentials_by_category(&self.db, user_id, category_id, page)
                .await?;
        self.open_all(records, &key)
    }

    /// Re-seal a credential with new contents under the current key.
    pub async fn update_credential(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        password_id: &PasswordId,
        website: &str,
        secret: &CredentialSecret,
    ) -> Result<(), VaultError> {
        validate_website(website)?;
        validate_secret(secret)?;
        let key = self.current_key(user_id).await?;
        let sealed = cipher::encrypt(secret, &key)?;
        let record = CredentialRecord {
            password_id: *password_id,
            user_id: *user_id,
            category_id: *category_id,
            website: website.to_string(),
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
            key_id: sealed.key_id,
        };
        credentials::replace_credential(&self.db, &record).await?;
        debug!(user_id = %user_id, password_id = %password_id, "credential updated");
        Ok(())
    }

    pub async fn delete_credential(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        password_id: &PasswordId,
    ) -> Result<(), VaultError> {
        credentials::delete_credential(&self.db, user_id, category_id, password_id).await?;
        debug!(user_id = %user_id, password_id = %password_id, "credential deleted");
        Ok(())
    }

    /// Create a category with a per-user unique name.
    pub async fn create_category(
        &self,
        user_id: &UserId,
        name: &str,
        description: &str,
    ) -> Result<Category, VaultError> {
        let category = Category {
            category_id: CategoryId::generate(),
            user_id: *user_id,
            name: validate_category_name(name)?,
            description: description.to_string(),
        };
        categories::insert_category(&self.db, &category).await?;
        debug!(user_id = %user_id, category_id = %category.category_id, "category created");
        Ok(category)
    }

    /// Look a category up by id or by name.
    pub async fn get_category(
        &self,
        user_id: &UserId,
        key: &CategoryKey,
    ) -> Result<Category, VaultError> {
        match key {
            CategoryKey::Id(id) => categories::get_category(&self.db, user_id, id).await,
            CategoryKey::Name(name) => {
                categories::get_category_by_name(&self.db, user_id, name).await
            }
        }
    }

    pub async fn list_categories(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Vec<Category>, VaultError> {
        categories::list_categories(&self.db, user_id, page).await
    }

    /// Rename or re-describe a category.
    pub async fn update_category(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        name: &str,
        description: &str,
    ) -> Result<Category, VaultError> {
        let category = Category {
            category_id: *category_id,
            user_id: *user_id,
            name: validate_category_name(name)?,
            description: description.to_string(),
        };
        categories::update_category(&self.db, &category).await?;
        Ok(category)
    }

    /// Delete a category and every credential in it.
    pub async fn delete_category(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
    ) -> Result<usize, VaultError> {
        let removed = categories::delete_category(&self.db, user_id, category_id).await?;
        info!(
            user_id = %user_id,
            category_id = %category_id,
            credentials_removed = removed,
            "category deleted"
        );
        Ok(removed)
    }
}

fn validate_website(website: &str) -> Result<(), VaultError> {
    if website.trim().is_empty() {
        return Err(VaultError::InvalidInput("website must not be empty".to_string()));
    }
    Ok(())
}

fn validate_secret(secret: &CredentialSecret) -> Result<(), VaultError> {
    if secret.username.is_empty() {
        return Err(VaultError::InvalidInput("username must not be empty".to_string()));
    }
    if secret.password.is_empty() {
        return Err(VaultError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(())
}

fn validate_category_name(name: &str) -> Result<String, VaultError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VaultError::InvalidInput(
            "category name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}
