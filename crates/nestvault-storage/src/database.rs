// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All access is serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use nestvault_config::StorageConfig;
use nestvault_core::VaultError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the vault database.
///
/// Cloning is cheap: every clone talks to the same background connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open the database described by the storage config, applying migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, VaultError> {
        Self::open_path(&config.database_path, config.wal_mode).await
    }

    /// Open (creating if needed) the database at `path`, applying migrations.
    pub async fn open_path(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, VaultError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| VaultError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        let db = Self { conn };
        db.initialize(wal_mode).await?;
        info!(path = %path.display(), wal_mode, "vault database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, VaultError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        let db = Self { conn };
        db.initialize(false).await?;
        Ok(db)
    }

    async fn initialize(&self, wal_mode: bool) -> Result<(), VaultError> {
        let applied = self
            .conn
            .call(move |conn| {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                if wal_mode {
                    let mode: String =
                        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                            row.get(0)
                        })?;
                    debug!(journal_mode = %mode, "journal mode set");
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                Ok(run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)??;
        debug!(applied, "migrations applied");
        Ok(())
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the connection, flushing pending work on the background thread.
    pub async fn close(self) -> Result<(), VaultError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Translate a tokio-rusqlite failure into the transient storage category.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> VaultError {
    VaultError::Storage {
        source: Box::new(e),
    }
}

/// Constraint classes the query layer maps onto domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
}

/// Classify a statement failure as a constraint violation, if it is one.
pub(crate) fn violation(e: &rusqlite::Error) -> Option<Violation> {
    let err = e.sqlite_error()?;
    if err.code != rusqlite::ErrorCode::ConstraintViolation {
        return None;
    }
    match err.extended_code {
        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            Some(Violation::Unique)
        }
        _ => None,
    }
}

/// Run a write inside the connection closure, splitting constraint
/// violations out of the hard-error channel.
pub(crate) fn classify<T>(
    result: rusqlite::Result<T>,
) -> rusqlite::Result<Result<T, Violation>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(e) => match violation(&e) {
            Some(v) => Ok(Err(v)),
            None => Err(e),
        },
    }
}
