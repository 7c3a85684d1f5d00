// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process rotation token store with per-entry expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use nestvault_core::{TokenStore, VaultError};
use tokio::time::Instant;
use tracing::debug;
use zeroize::Zeroizing;

struct Entry {
    value: Zeroizing<String>,
    expires_at: Instant,
}

/// Token store held in memory. Clones share the same entries.
///
/// Suitable when the identity service and the vault run in one process, and
/// for tests. Expiry follows the tokio clock, so paused-time tests can
/// advance past a TTL deterministically.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "expired rotation tokens purged");
        }
        purged
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .map(|e| (e.expires_at > now).then(|| e.value.to_string()));
        match live {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.entries.remove_if(key, |_, e| e.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VaultError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| VaultError::InvalidInput(format!("token ttl {ttl:?} is too large")))?;
        self.purge_expired();
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Zeroizing::new(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), VaultError> {
        self.entries.remove(key);
        Ok(())
    }
}
