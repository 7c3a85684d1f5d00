// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NestVault maintenance CLI.
//!
//! Applies schema migrations, stashes rotation tokens on behalf of the
//! identity service, and runs or inspects per-user key rotation.

mod rotate;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nestvault_config::NestvaultConfig;
use nestvault_core::{UserId, VaultError};
use nestvault_storage::Database;
use tracing::error;

/// NestVault - per-user encrypted credential storage.
#[derive(Parser, Debug)]
#[command(name = "nestvault", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or upgrade the database schema.
    Migrate,
    /// Store a user's previous password hash as a rotation token.
    ///
    /// The hash is read from NESTVAULT_PREVIOUS_SECRET or prompted for.
    StashToken {
        /// User whose password just changed.
        user_id: UserId,
    },
    /// Re-encrypt a user's vault under their current key.
    Rotate {
        user_id: UserId,
    },
    /// Show how many of a user's credentials still need rotation.
    Status {
        user_id: UserId,
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => nestvault_config::load_and_validate_path(path),
        None => nestvault_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            nestvault_config::render_errors(&errors);
            std::process::exit(2);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, &config).await {
        error!(error = %e, "command failed");
        eprintln!("nestvault: {e}");
        std::process::exit(exit_code(&e));
    }
}

async fn run(command: Commands, config: &NestvaultConfig) -> Result<(), VaultError> {
    match command {
        Commands::Migrate => {
            let db = Database::open(&config.storage).await?;
            db.close().await?;
            println!("database ready at {}", config.storage.database_path);
            Ok(())
        }
        Commands::StashToken { user_id } => rotate::run_stash_token(config, &user_id).await,
        Commands::Rotate { user_id } => rotate::run_rotate(config, &user_id).await,
        Commands::Status { user_id, json } => status::run_status(config, &user_id, json).await,
    }
}

/// Distinct exit codes for the outcomes an operator script reacts to.
fn exit_code(e: &VaultError) -> i32 {
    match e {
        VaultError::RotationWindowExpired { .. } => 3,
        VaultError::RotationIncomplete { .. } => 4,
        VaultError::NotFound { .. } => 5,
        _ => 1,
    }
}

/// Initialize the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "nestvault={log_level},nestvault_vault={log_level},nestvault_storage={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rotate_with_user_id() {
        let id = "0191e8e0-0000-7000-8000-000000000001";
        let cli = Cli::try_parse_from(["nestvault", "rotate", id]).unwrap();
        match cli.command {
            Commands::Rotate { user_id } => assert_eq!(user_id.to_string(), id),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_user_id() {
        assert!(Cli::try_parse_from(["nestvault", "status", "not-a-uuid"]).is_err());
    }

    #[test]
    fn exit_codes_distinguish_rotation_outcomes() {
        let expired = VaultError::RotationWindowExpired {
            user_id: "u".into(),
        };
        assert_eq!(exit_code(&expired), 3);
        assert_eq!(exit_code(&VaultError::RotationIncomplete { remaining: 2 }), 4);
        assert_eq!(exit_code(&VaultError::Internal("x".into())), 1);
    }
}
