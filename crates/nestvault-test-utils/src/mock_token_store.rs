// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token store wrapper that can be told to fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nestvault_core::{TokenStore, VaultError};
use nestvault_vault::MemoryTokenStore;

/// Delegates to a [`MemoryTokenStore`] unless a failure switch is set.
#[derive(Clone, Default)]
pub struct FlakyTokenStore {
    inner: MemoryTokenStore,
    fail_reads: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl FlakyTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing store, for inspecting what is left behind.
    pub fn inner(&self) -> &MemoryTokenStore {
        &self.inner
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn unavailable(op: &str) -> VaultError {
        VaultError::TokenStore {
            message: format!("{op}: token store unavailable"),
            source: None,
        }
    }
}

#[async_trait]
impl TokenStore for FlakyTokenStore {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable("get"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VaultError> {
        self.inner.put(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), VaultError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::unavailable("delete"));
        }
        self.inner.delete(key).await
    }
}
