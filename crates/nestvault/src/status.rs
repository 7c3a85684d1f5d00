// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nestvault status` command implementation.

use nestvault_config::NestvaultConfig;
use nestvault_core::{UserId, VaultError};
use nestvault_vault::RotationStatus;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub user_id: String,
    pub current: u64,
    pub stale: u64,
    pub complete: bool,
    pub token_pending: bool,
}

impl StatusResponse {
    fn new(user_id: &UserId, status: &RotationStatus) -> Self {
        Self {
            user_id: user_id.to_string(),
            current: status.current,
            stale: status.stale,
            complete: status.is_complete(),
            token_pending: status.token_pending,
        }
    }
}

fn render_plain(response: &StatusResponse) -> String {
    let state = match (response.complete, response.token_pending) {
        (true, _) => "up to date",
        (false, true) => "rotation pending",
        (false, false) => "stale records, no rotation token",
    };
    format!(
        "{}: {state} ({} current, {} under a previous key)",
        response.user_id, response.current, response.stale
    )
}

/// Run the `nestvault status` command.
pub async fn run_status(
    config: &NestvaultConfig,
    user_id: &UserId,
    json: bool,
) -> Result<(), VaultError> {
    let coordinator = crate::rotate::coordinator(config).await?;
    let status = coordinator.rotation_status(user_id).await?;
    let response = StatusResponse::new(user_id, &status);

    if json {
        let out = serde_json::to_string_pretty(&response)
            .map_err(|e| VaultError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        println!("{}", render_plain(&response));
    }
    Ok(())
}
