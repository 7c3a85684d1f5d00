// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./nestvault.toml` > `~/.config/nestvault/nestvault.toml`
//! > `/etc/nestvault/nestvault.toml` with environment variable overrides via
//! the `NESTVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::NestvaultConfig;

/// Config file name looked up in every hierarchy directory.
pub const CONFIG_FILE_NAME: &str = "nestvault.toml";

/// System-wide config path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/nestvault/nestvault.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "NESTVAULT_";

/// Sections that may be overridden from the environment. Other `NESTVAULT_*`
/// variables (for example the CLI's secret input) are not config keys.
const ENV_SECTIONS: &[&str] = &["storage_", "rotation_", "logging_"];

/// Per-user config path under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nestvault").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/nestvault/nestvault.toml` (system-wide)
/// 3. `~/.config/nestvault/nestvault.toml` (user XDG config)
/// 4. `./nestvault.toml` (local directory)
/// 5. `NESTVAULT_*` environment variables
pub fn load_config() -> Result<NestvaultConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<NestvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NestvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NestvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NestvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(NestvaultConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment provider mapping `NESTVAULT_SECTION_FIELD` to `section.field`.
///
/// Uses an explicit mapping rather than `Env::split("_")` because field names
/// contain underscores: `NESTVAULT_ROTATION_CHUNK_SIZE` must map to
/// `rotation.chunk_size`, not `rotation.chunk.size`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
        .filter(|key| {
            let key = key.as_str().to_ascii_lowercase();
            ENV_SECTIONS.iter().any(|section| key.starts_with(section))
        })
        .map(|key| {
            let mapped = key
                .as_str()
                .to_ascii_lowercase()
                .replacen("storage_", "storage.", 1)
                .replacen("rotation_", "rotation.", 1)
                .replacen("logging_", "logging.", 1);
            mapped.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NESTVAULT_ROTATION_CHUNK_SIZE", "12");
            jail.set_env("NESTVAULT_STORAGE_DATABASE_PATH", "/tmp/jail.db");
            jail.set_env("NESTVAULT_LOGGING_LEVEL", "debug");

            let config: NestvaultConfig = Figment::new()
                .merge(Serialized::defaults(NestvaultConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.rotation.chunk_size, 12);
            assert_eq!(config.storage.database_path, "/tmp/jail.db");
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn unrelated_prefixed_env_vars_are_ignored() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NESTVAULT_PREVIOUS_SECRET", "not-a-config-key");

            let config: NestvaultConfig = Figment::new()
                .merge(Serialized::defaults(NestvaultConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.rotation.chunk_size, 4);
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                "[rotation]\nmax_workers = 2\ntoken_ttl_secs = 600\n",
            )?;

            let config = load_config_from_path(Path::new(CONFIG_FILE_NAME))?;
            assert_eq!(config.rotation.max_workers, 2);
            assert_eq!(config.rotation.token_ttl_secs, 600);
            Ok(())
        });
    }
}
