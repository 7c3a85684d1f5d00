// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential payload encoding and sealing.
//!
//! The plaintext triple is serialized to JSON and sealed as one AEAD message.
//! Nothing in this module touches storage.

use std::fmt;

use nestvault_core::{KeyId, VaultError};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto;
use crate::keys::DerivedKey;

/// Decrypted credential fields. Lives only in memory and is wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialSecret {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub description: String,
}

impl CredentialSecret {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            description: description.into(),
        }
    }
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSecret")
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("description", &"[REDACTED]")
            .finish()
    }
}

/// Output of sealing one credential.
#[derive(Debug, Clone)]
pub struct SealedPayload {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub key_id: KeyId,
}

/// Serialize and seal `secret` under `key` with a fresh nonce.
pub fn encrypt(secret: &CredentialSecret, key: &DerivedKey) -> Result<SealedPayload, VaultError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(secret)
            .map_err(|e| VaultError::Internal(format!("failed to encode credential: {e}")))?,
    );
    let (ciphertext, nonce) = crypto::seal(key.bytes(), &plaintext)?;
    Ok(SealedPayload {
        nonce: nonce.to_vec(),
        ciphertext,
        key_id: key.id(),
    })
}

/// Open and decode a sealed credential.
///
/// Authentication failures and undecodable payloads are both integrity errors.
pub fn decrypt(
    nonce: &[u8],
    ciphertext: &[u8],
    key: &DerivedKey,
) -> Result<CredentialSecret, VaultError> {
    let plaintext = crypto::open(key.bytes(), nonce, ciphertext)?;
    serde_json::from_slice(&plaintext)
        .map_err(|e| VaultError::Integrity(format!("malformed credential payload: {e}")))
}
