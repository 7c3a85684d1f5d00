// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::NestvaultConfig;

/// Upper bound on rotation workers. Every worker holds a chunk transaction
/// against the shared store connection.
pub const MAX_ROTATION_WORKERS: usize = 64;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &NestvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.rotation.chunk_size == 0 {
        errors.push(ConfigError::Validation {
            message: "rotation.chunk_size must be at least 1".to_string(),
        });
    }

    if config.rotation.max_workers == 0 || config.rotation.max_workers > MAX_ROTATION_WORKERS {
        errors.push(ConfigError::Validation {
            message: format!(
                "rotation.max_workers must be between 1 and {MAX_ROTATION_WORKERS}, got {}",
                config.rotation.max_workers
            ),
        });
    }

    if config.rotation.chunk_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "rotation.chunk_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.rotation.token_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "rotation.token_ttl_secs must be at least 1".to_string(),
        });
    }

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
