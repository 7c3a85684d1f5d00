// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed rotation token store.
//!
//! Used when the identity service and the maintenance process share a
//! database file instead of a cache server. Expired rows are treated as absent
//! and removed lazily on read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use nestvault_core::{TokenStore, VaultError};
use rusqlite::params;
use tracing::debug;

use crate::database::Database;

/// Token store sharing the vault database.
#[derive(Clone)]
pub struct SqliteTokenStore {
    db: Database,
}

impl SqliteTokenStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Remove every expired token. Returns how many were purged.
    pub async fn purge_expired(&self) -> Result<usize, VaultError> {
        let now = Utc::now().timestamp_millis();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM rotation_tokens WHERE expires_at <= ?1",
                    params![now],
                )
            })
            .await
            .map_err(token_err("purge"))
    }
}

fn token_err(op: &'static str) -> impl Fn(tokio_rusqlite::Error<rusqlite::Error>) -> VaultError {
    move |e| VaultError::TokenStore {
        message: format!("token {op} failed"),
        source: Some(Box::new(e)),
    }
}

fn expires_at(ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    Utc::now().timestamp_millis().saturating_add(ttl_ms)
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        self.db
            .connection()
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT value, expires_at FROM rotation_tokens WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                );
                match result {
                    Ok((value, expires)) if expires > now => Ok(Some(value)),
                    Ok(_) => {
                        conn.execute("DELETE FROM rotation_tokens WHERE key = ?1", params![key])?;
                        debug!("expired rotation token removed");
                        Ok(None)
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(token_err("read"))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VaultError> {
        let key = key.to_string();
        let value = value.to_string();
        let expires = expires_at(ttl);
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO rotation_tokens (key, value, expires_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                    expires_at = excluded.expires_at",
                    params![key, value, expires],
                )?;
                Ok(())
            })
            .await
            .map_err(token_err("write"))
    }

    async fn delete(&self, key: &str) -> Result<(), VaultError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute("DELETE FROM rotation_tokens WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(token_err("delete"))
    }
}
