// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.

use std::fmt;

use nestvault_core::{CategoryId, KeyId, PasswordId, UserId};
use secrecy::SecretString;
use uuid::Uuid;

/// One stored credential: plaintext label plus the sealed payload.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub password_id: PasswordId,
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub website: String,
    /// 12-byte AES-GCM nonce, fresh for every seal.
    pub nonce: Vec<u8>,
    /// Ciphertext with the 16-byte authentication tag appended.
    pub ciphertext: Vec<u8>,
    /// Fingerprint of the key the payload is sealed under.
    pub key_id: KeyId,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("password_id", &self.password_id)
            .field("user_id", &self.user_id)
            .field("category_id", &self.category_id)
            .field("website", &self.website)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("key_id", &self.key_id)
            .finish()
    }
}

/// A user-owned grouping of credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub category_id: CategoryId,
    pub user_id: UserId,
    pub name: String,
    pub description: String,
}

/// Inputs to key derivation for one user.
pub struct KdfMaterial {
    /// Current password-derived secret, owned by the identity service.
    pub password_hash: SecretString,
    /// Per-user salt, fixed at registration.
    pub salt: Vec<u8>,
}

impl fmt::Debug for KdfMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KdfMaterial")
            .field("password_hash", &"[REDACTED]")
            .field("salt_len", &self.salt.len())
            .finish()
    }
}

/// Number of a user's credentials sealed under one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyIdCount {
    pub key_id: KeyId,
    pub count: u64,
}

/// Read a TEXT uuid column.
pub(crate) fn uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read a BLOB key id column.
pub(crate) fn key_id_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<KeyId> {
    let bytes: Vec<u8> = row.get(idx)?;
    KeyId::from_slice(&bytes).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Blob, Box::new(e))
    })
}
