// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral key/value store holding rotation tokens.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::VaultError;
use crate::types::UserId;

/// Key prefix shared with the identity collaborator for rotation tokens.
pub const ROTATION_TOKEN_PREFIX: &str = "reset:";

/// Cache key of the rotation token for `user_id`.
pub fn rotation_token_key(user_id: &UserId) -> String {
    format!("{ROTATION_TOKEN_PREFIX}{user_id}")
}

/// A TTL-bounded string store (the deployment's cache service).
///
/// Implementations must treat an expired entry exactly like a missing one:
/// `get` returns `Ok(None)` once the TTL has elapsed.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Fetch a live value.
    async fn get(&self, key: &str) -> Result<Option<String>, VaultError>;

    /// Store `value` under `key`, replacing any previous value, expiring after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VaultError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), VaultError>;
}
