// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nestvault stash-token` and `nestvault rotate` command implementations.
//!
//! Both use the SQLite token store in the vault database, so the identity
//! service's hook and the maintenance job only need to share the file.

use std::sync::Arc;

use nestvault_config::NestvaultConfig;
use nestvault_core::{UserId, VaultError};
use nestvault_storage::{Database, SqliteTokenStore};
use nestvault_vault::{read_previous_secret, RotationCoordinator, RotationSettings};

/// Open the database and build a coordinator backed by its token table.
pub async fn coordinator(config: &NestvaultConfig) -> Result<RotationCoordinator, VaultError> {
    let db = Database::open(&config.storage).await?;
    let tokens = SqliteTokenStore::new(db.clone());
    let purged = tokens.purge_expired().await?;
    if purged > 0 {
        tracing::debug!(purged, "expired rotation tokens removed");
    }
    Ok(RotationCoordinator::new(
        db,
        Arc::new(tokens),
        RotationSettings::from(&config.rotation),
    ))
}

/// Run the `nestvault stash-token` command.
pub async fn run_stash_token(config: &NestvaultConfig, user_id: &UserId) -> Result<(), VaultError> {
    let previous = read_previous_secret()?;
    let coordinator = coordinator(config).await?;
    coordinator.stash_previous_secret(user_id, &previous).await?;
    println!(
        "rotation token stored for {user_id} (expires in {}s)",
        coordinator.settings().token_ttl.as_secs()
    );
    Ok(())
}

/// Run the `nestvault rotate` command.
pub async fn run_rotate(config: &NestvaultConfig, user_id: &UserId) -> Result<(), VaultError> {
    let coordinator = coordinator(config).await?;
    let report = coordinator.rotate(user_id).await?;
    println!(
        "rotation complete for {user_id}: {} re-encrypted, {} already current, {} changed during rotation",
        report.migrated, report.already_current, report.superseded
    );
    Ok(())
}
