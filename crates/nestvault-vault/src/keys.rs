// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derived per-user keys and their fingerprints.

use std::fmt;

use nestvault_core::{KeyId, UserId, VaultError, KEY_ID_LEN};
use ring::hmac;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::kdf::{self, KEY_LEN};

const KEY_ID_LABEL: &[u8] = b"nestvault/key-id/v1";

/// A user's AES key together with its public fingerprint.
///
/// The key bytes are zeroed on drop and never appear in `Debug` output.
pub struct DerivedKey {
    key: Zeroizing<[u8; KEY_LEN]>,
    id: KeyId,
}

impl DerivedKey {
    /// Derive the key for `secret` and compute its fingerprint.
    pub fn derive(secret: &[u8], user_id: &UserId, salt: &[u8]) -> Result<Self, VaultError> {
        let key = kdf::derive_key(secret, user_id, salt)?;
        let id = fingerprint(&key);
        Ok(Self { key, id })
    }

    /// Derive on the blocking pool; PBKDF2 is CPU-bound.
    pub async fn derive_blocking(
        secret: SecretString,
        user_id: UserId,
        salt: Vec<u8>,
    ) -> Result<Self, VaultError> {
        tokio::task::spawn_blocking(move || {
            Self::derive(secret.expose_secret().as_bytes(), &user_id, &salt)
        })
        .await
        .map_err(|e| VaultError::Internal(format!("key derivation task failed: {e}")))?
    }

    pub fn id(&self) -> KeyId {
        self.id
    }

    pub(crate) fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .field("id", &self.id)
            .finish()
    }
}

/// HMAC-SHA256 of a fixed label keyed by `key`, truncated to a key id.
///
/// Stable for a given key, and a one-way function of it.
pub fn fingerprint(key: &[u8; KEY_LEN]) -> KeyId {
    let tag = hmac::sign(&hmac::Key::new(hmac::HMAC_SHA256, key), KEY_ID_LABEL);
    let mut id = [0u8; KEY_ID_LEN];
    id.copy_from_slice(&tag.as_ref()[..KEY_ID_LEN]);
    KeyId(id)
}
