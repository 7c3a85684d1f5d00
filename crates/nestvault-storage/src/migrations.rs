// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary via
//! `embed_migrations!` and applied when a [`Database`](crate::Database) opens.

use nestvault_core::VaultError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery records applied versions in `refinery_schema_history`, so calling
/// this on an up-to-date database is a no-op.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, VaultError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| VaultError::Storage {
            source: Box::new(e),
        })?;
    Ok(report.applied_migrations().len())
}
