// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Previous-secret acquisition via environment variable or TTY prompt.

use nestvault_core::VaultError;
use secrecy::SecretString;

/// Environment variable carrying the previous password-derived secret.
pub const PREVIOUS_SECRET_ENV_VAR: &str = "NESTVAULT_PREVIOUS_SECRET";

/// Read the previous password-derived secret for `stash-token`.
///
/// Priority:
/// 1. `NESTVAULT_PREVIOUS_SECRET` (for scripted identity-service hooks)
/// 2. Interactive TTY prompt via `rpassword`
pub fn read_previous_secret() -> Result<SecretString, VaultError> {
    match std::env::var(PREVIOUS_SECRET_ENV_VAR) {
        Ok(value) if !value.is_empty() => return Ok(SecretString::from(value)),
        _ => {}
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("Previous password hash: ");
        let value = rpassword::read_password()
            .map_err(|e| VaultError::InvalidInput(format!("failed to read secret: {e}")))?;
        if value.is_empty() {
            return Err(VaultError::InvalidInput("empty secret not allowed".to_string()));
        }
        return Ok(SecretString::from(value));
    }

    Err(VaultError::InvalidInput(format!(
        "no previous secret provided; set {PREVIOUS_SECRET_ENV_VAR} or run interactively"
    )))
}
