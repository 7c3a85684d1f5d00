// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the NestVault configuration system.

use std::time::Duration;

use nestvault_config::diagnostic::{suggest_key, ConfigError};
use nestvault_config::model::NestvaultConfig;
use nestvault_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[storage]
database_path = "/tmp/vault.db"
wal_mode = false

[rotation]
chunk_size = 16
max_workers = 2
chunk_timeout_secs = 5
token_ttl_secs = 600

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.storage.database_path, "/tmp/vault.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.rotation.chunk_size, 16);
    assert_eq!(config.rotation.max_workers, 2);
    assert_eq!(config.rotation.chunk_timeout(), Duration::from_secs(5));
    assert_eq!(config.rotation.token_ttl(), Duration::from_secs(600));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.rotation.chunk_size, 4);
    assert_eq!(config.rotation.max_workers, 4);
    assert_eq!(config.rotation.token_ttl(), Duration::from_secs(1800));
    assert!(config.storage.wal_mode);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn unknown_field_in_rotation_is_rejected() {
    let toml = r#"
[rotation]
chunk_sise = 8
"#;
    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("chunk_sise"),
        "error should mention the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[cache]
url = "redis://localhost"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = r#"
[rotation]
max_workrs = 8
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("should produce an UnknownKey diagnostic");
    assert_eq!(unknown.0, "max_workrs");
    assert_eq!(unknown.1.as_deref(), Some("max_workers"));
}

#[test]
fn wrong_type_produces_invalid_type_diagnostic() {
    let toml = r#"
[rotation]
chunk_size = "lots"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "expected InvalidType, got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[rotation]
chunk_size = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero chunk size is invalid");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("chunk_size")));
}

#[test]
fn explicit_file_is_loaded_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nestvault.toml");
    std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();

    let config: NestvaultConfig = load_and_validate_path(&path).expect("valid file");
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn suggest_key_matches_storage_keys() {
    let valid = &["database_path", "wal_mode"];
    assert_eq!(
        suggest_key("databse_path", valid),
        Some("database_path".to_string())
    );
}
