// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 key derivation from a password-derived secret.
//!
//! The iteration count is part of the stored-data format: every record in
//! every vault was sealed with a key derived at this cost.

use std::num::NonZeroU32;

use nestvault_core::{UserId, VaultError};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// PBKDF2 iteration count. Changing it orphans every stored record.
pub const PBKDF2_ITERATIONS: u32 = 4096;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Per-user salt length in bytes.
pub const SALT_LEN: usize = 16;

const ITERATIONS: NonZeroU32 = match NonZeroU32::new(PBKDF2_ITERATIONS) {
    Some(n) => n,
    None => panic!("PBKDF2 iteration count must be non-zero"),
};

/// Derive a 32-byte key over `secret || ":" || user_id`, salted per user.
///
/// Deterministic for identical inputs. The returned key is zeroed on drop.
pub fn derive_key(
    secret: &[u8],
    user_id: &UserId,
    salt: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    if salt.len() != SALT_LEN {
        return Err(VaultError::InvalidInput(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let user = user_id.to_string();
    let mut input = Zeroizing::new(Vec::with_capacity(secret.len() + 1 + user.len()));
    input.extend_from_slice(secret);
    input.push(b':');
    input.extend_from_slice(user.as_bytes());

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        ITERATIONS,
        salt,
        &input,
        key.as_mut(),
    );
    Ok(key)
}

/// Generate a random per-user salt. Called once at registration.
pub fn generate_salt() -> Result<[u8; SALT_LEN], VaultError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| VaultError::Crypto("failed to generate random salt".to_string()))?;
    Ok(salt)
}
