// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-encryption of a user's vault after a password change.
//!
//! The identity service stashes the previous password hash as a rotation
//! token. [`RotationCoordinator::rotate`] derives the old and new keys,
//! re-seals every record still under the old key in bounded-parallel chunks,
//! and deletes the token only once every chunk has committed.
//!
//! Records carry the fingerprint of their sealing key, so a run that fails
//! partway can be repeated while the token is valid: records already moved to
//! the new key are skipped.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use nestvault_config::RotationConfig;
use nestvault_core::{rotation_token_key, TokenStore, UserId, VaultError};
use nestvault_storage::queries::{credentials, users};
use nestvault_storage::{CredentialRecord, Database};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::cipher;
use crate::keys::DerivedKey;

/// Tuning knobs for a rotation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSettings {
    /// Records re-sealed and committed per transaction.
    pub chunk_size: usize,
    /// Chunks in flight at once.
    pub max_workers: usize,
    /// Budget for one chunk's re-seal and commit.
    pub chunk_timeout: Duration,
    /// Lifetime of a stashed rotation token.
    pub token_ttl: Duration,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self::from(&RotationConfig::default())
    }
}

impl From<&RotationConfig> for RotationSettings {
    fn from(config: &RotationConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            max_workers: config.max_workers,
            chunk_timeout: config.chunk_timeout(),
            token_ttl: config.token_ttl(),
        }
        .normalized()
    }
}

impl RotationSettings {
    /// Raise zero chunk sizes and worker counts to one. A zero chunk never
    /// drains the queue and a zero-permit pool never admits a task.
    pub fn normalized(self) -> Self {
        Self {
            chunk_size: self.chunk_size.max(1),
            max_workers: self.max_workers.max(1),
            ..self
        }
    }
}

/// Outcome of a completed rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Records re-sealed under the new key by this run.
    pub migrated: usize,
    /// Records that were already under the new key when the run started.
    pub already_current: usize,
    /// Records that left the old key while the run was in flight
    /// (rewritten or deleted by the user) and were not touched.
    pub superseded: usize,
}

/// How a user's credentials are spread across keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationStatus {
    /// Records readable with the current key.
    pub current: u64,
    /// Records sealed under any other key.
    pub stale: u64,
    /// Whether a rotation token is waiting to be consumed.
    pub token_pending: bool,
}

impl RotationStatus {
    pub fn is_complete(&self) -> bool {
        self.stale == 0
    }
}

struct ChunkOutcome {
    replaced: usize,
    submitted: usize,
}

/// Drives key rotation for one user at a time.
pub struct RotationCoordinator {
    db: Database,
    tokens: Arc<dyn TokenStore>,
    settings: RotationSettings,
}

impl RotationCoordinator {
    pub fn new(db: Database, tokens: Arc<dyn TokenStore>, settings: RotationSettings) -> Self {
        let normalized = settings.normalized();
        if normalized != settings {
            warn!(
                chunk_size = settings.chunk_size,
                max_workers = settings.max_workers,
                "rotation chunk size and worker count must be at least 1; clamped"
            );
        }
        Self {
            db,
            tokens,
            settings: normalized,
        }
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    /// Record the user's previous password hash for a later rotation.
    ///
    /// This is the identity service's half of the contract: it runs right
    /// after a verified password change, before the new hash is stored.
    pub async fn stash_previous_secret(
        &self,
        user_id: &UserId,
        previous_hash: &SecretString,
    ) -> Result<(), VaultError> {
        if previous_hash.expose_secret().is_empty() {
            return Err(VaultError::InvalidInput(
                "previous password-derived secret must not be empty".to_string(),
            ));
        }
        let encoded = Zeroizing::new(BASE64.encode(previous_hash.expose_secret()));
        self.tokens
            .put(&rotation_token_key(user_id), &encoded, self.settings.token_ttl)
            .await?;
        info!(
            user_id = %user_id,
            ttl_secs = self.settings.token_ttl.as_secs(),
            store = self.tokens.name(),
            "rotation token stored"
        );
        Ok(())
    }

    async fn previous_secret(&self, user_id: &UserId) -> Result<SecretString, VaultError> {
        let token = self
            .tokens
            .get(&rotation_token_key(user_id))
            .await?
            .map(Zeroizing::new)
            .ok_or_else(|| VaultError::RotationWindowExpired {
                user_id: user_id.to_string(),
            })?;
        let decoded = Zeroizing::new(BASE64.decode(token.as_bytes()).map_err(|e| {
            VaultError::Integrity(format!("rotation token is not valid base64: {e}"))
        })?);
        let secret = String::from_utf8(decoded.to_vec())
            .map_err(|_| VaultError::Integrity("rotation token is not valid UTF-8".to_string()))?;
        if secret.is_empty() {
            return Err(VaultError::Integrity("rotation token is empty".to_string()));
        }
        Ok(SecretString::from(secret))
    }

    /// Re-encrypt every credential the user still has under the previous key.
    ///
    /// Fails with [`VaultError::RotationWindowExpired`] before touching any
    /// record when the token is gone. If some chunks do not commit the token is
    /// kept and [`VaultError::RotationIncomplete`] is returned; calling again
    /// resumes where the failed run stopped.
    pub async fn rotate(&self, user_id: &UserId) -> Result<RotationReport, VaultError> {
        let previous = self.previous_secret(user_id).await?;

        let material = users::kdf_material(&self.db, user_id).await?;
        if material.password_hash.expose_secret().is_empty() {
            return Err(VaultError::InvalidInput(
                "password-derived secret must not be empty".to_string(),
            ));
        }
        let (old_key, new_key) = tokio::try_join!(
            DerivedKey::derive_blocking(previous, *user_id, material.salt.clone()),
            DerivedKey::derive_blocking(material.password_hash, *user_id, material.salt),
        )?;
        let old_key = Arc::new(old_key);
        let new_key = Arc::new(new_key);

        let records = credentials::list_all_credentials(&self.db, user_id).await?;
        let total = records.len();

        let mut report = RotationReport::default();
        let mut unreadable = 0usize;
        let mut pending = Vec::new();
        for record in records {
            if record.key_id == new_key.id() {
                report.already_current += 1;
            } else if record.key_id == old_key.id() {
                pending.push(record);
            } else {
                error!(
                    user_id = %user_id,
                    password_id = %record.password_id,
                    key_id = %record.key_id,
                    "credential sealed under an unknown key; cannot rotate"
                );
                unreadable += 1;
            }
        }

        info!(
            user_id = %user_id,
            total,
            to_migrate = pending.len(),
            already_current = report.already_current,
            chunk_size = self.settings.chunk_size,
            "rotation starting"
        );

        let to_migrate = pending.len();
        let mut done = 0usize;
        if !pending.is_empty() {
            let semaphore = Arc::new(Semaphore::new(self.settings.max_workers));
            let mut tasks = JoinSet::new();
            let mut records = pending.into_iter().peekable();
            while records.peek().is_some() {
                let chunk: Vec<CredentialRecord> =
                    records.by_ref().take(self.settings.chunk_size).collect();
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| VaultError::Internal(format!("rotation pool closed: {e}")))?;
                let db = self.db.clone();
                let old_key = Arc::clone(&old_key);
                let new_key = Arc::clone(&new_key);
                let timeout = self.settings.chunk_timeout;
                tasks.spawn(async move {
                    let _permit = permit;
                    let submitted = chunk.len();
                    match tokio::time::timeout(
                        timeout,
                        reseal_chunk(&db, chunk, &old_key, &new_key),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => {
                            warn!(submitted, "rotation chunk timed out");
                            Err(VaultError::Timeout { duration: timeout })
                        }
                    }
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(outcome)) => {
                        report.migrated += outcome.replaced;
                        report.superseded += outcome.submitted - outcome.replaced;
                        done += outcome.submitted;
                    }
                    Ok(Err(e)) => {
                        error!(user_id = %user_id, error = %e, "rotation chunk failed");
                    }
                    Err(e) => {
                        error!(user_id = %user_id, error = %e, "rotation chunk task aborted");
                    }
                }
            }
        }

        let remaining = (to_migrate - done) + unreadable;
        if remaining > 0 {
            warn!(
                user_id = %user_id,
                migrated = report.migrated,
                remaining,
                "rotation incomplete; token kept for retry"
            );
            return Err(VaultError::RotationIncomplete { remaining });
        }

        self.tokens.delete(&rotation_token_key(user_id)).await?;
        info!(
            user_id = %user_id,
            migrated = report.migrated,
            already_current = report.already_current,
            superseded = report.superseded,
            "rotation complete"
        );
        Ok(report)
    }

    /// Count the user's records under the current key versus any other key.
    pub async fn rotation_status(&self, user_id: &UserId) -> Result<RotationStatus, VaultError> {
        let material = users::kdf_material(&self.db, user_id).await?;
        let current_key =
            DerivedKey::derive_blocking(material.password_hash, *user_id, material.salt).await?;
        let counts = credentials::key_id_counts(&self.db, user_id).await?;
        let token_pending = self
            .tokens
            .get(&rotation_token_key(user_id))
            .await?
            .is_some();

        let (current, stale) = counts.iter().fold((0u64, 0u64), |(cur, stale), c| {
            if c.key_id == current_key.id() {
                (cur + c.count, stale)
            } else {
                (cur, stale + c.count)
            }
        });
        Ok(RotationStatus {
            current,
            stale,
            token_pending,
        })
    }
}

/// Decrypt a chunk with the old key, re-seal with the new one, and commit it
/// in a single transaction guarded on the old key id.
async fn reseal_chunk(
    db: &Database,
    chunk: Vec<CredentialRecord>,
    old_key: &DerivedKey,
    new_key: &DerivedKey,
) -> Result<ChunkOutcome, VaultError> {
    let submitted = chunk.len();
    let mut resealed = Vec::with_capacity(submitted);
    for record in chunk {
        let secret = cipher::decrypt(&record.nonce, &record.ciphertext, old_key).inspect_err(|e| {
            error!(
                user_id = %record.user_id,
                password_id = %record.password_id,
                error = %e,
                "credential failed integrity check during rotation"
            );
        })?;
        let sealed = cipher::encrypt(&secret, new_key)?;
        resealed.push(CredentialRecord {
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
            key_id: sealed.key_id,
            ..record
        });
    }
    let replaced = credentials::replace_chunk(db, resealed, old_key.id()).await?;
    debug!(submitted, replaced, "rotation chunk committed");
    Ok(ChunkOutcome {
        replaced,
        submitted,
    })
}
