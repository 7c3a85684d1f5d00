// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy shared by the repository, service, and rotation layers.
//!
//! The storage layer translates backend failures into these variants once;
//! the layers above only aggregate and log them.

use thiserror::Error;

/// The primary error type used across NestVault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested credential, category, or KDF material does not exist
    /// within the caller's scope.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Ciphertext failed authentication or the decrypted payload is malformed.
    /// Either the wrong key was used or the stored data is corrupted.
    #[error("data integrity failure: {0}")]
    Integrity(String),

    /// The record is sealed under a key other than the user's current key.
    /// Reading it requires a rotation first.
    #[error("credential {password_id} is sealed under a previous key; rotation pending")]
    StaleKey { password_id: String },

    /// Uniqueness violation on insert or rename.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The rotation token for the user is missing or has expired, so the
    /// previous key can no longer be derived.
    #[error("rotation window expired for user {user_id}")]
    RotationWindowExpired { user_id: String },

    /// A rotation run finished with records still sealed under the old key.
    /// Re-running the rotation while the token is valid resumes it.
    #[error("rotation incomplete: {remaining} credential(s) were not re-encrypted")]
    RotationIncomplete { remaining: usize },

    /// Caller supplied an argument the vault refuses to act on.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Relational store failure (connection, query, transaction).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Ephemeral token store failure.
    #[error("token store error: {message}")]
    TokenStore {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cryptographic primitive failure (key setup, random source).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Whether the failure came from infrastructure and may succeed if the
    /// caller retries. The vault itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VaultError::Storage { .. } | VaultError::TokenStore { .. } | VaultError::Timeout { .. }
        )
    }
}
