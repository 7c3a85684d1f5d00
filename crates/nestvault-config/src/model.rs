// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level NestVault configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NestvaultConfig {
    /// Relational store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key rotation settings.
    #[serde(default)]
    pub rotation: RotationConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("nestvault").join("nestvault.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("nestvault.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Key rotation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RotationConfig {
    /// Credentials re-encrypted per transaction.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum number of chunk transactions in flight at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Deadline for a single chunk, in seconds. A chunk that misses it is
    /// counted as failed; other chunks are unaffected.
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,

    /// Lifetime of a stashed rotation token, in seconds. Matches the identity
    /// service's post-verification session window.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl RotationConfig {
    /// Chunk deadline as a [`Duration`].
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    /// Rotation token lifetime as a [`Duration`].
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_workers: default_max_workers(),
            chunk_timeout_secs: default_chunk_timeout_secs(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_chunk_size() -> usize {
    4
}

fn default_max_workers() -> usize {
    4
}

fn default_chunk_timeout_secs() -> u64 {
    30
}

fn default_token_ttl_secs() -> u64 {
    30 * 60
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
