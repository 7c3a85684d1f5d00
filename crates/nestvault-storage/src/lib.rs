// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the NestVault credential vault.
//!
//! WAL-mode SQLite with embedded migrations, a single background connection
//! via `tokio-rusqlite`, tenant-scoped queries for credentials, categories,
//! and KDF material, and a SQLite-backed rotation token store.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod token_store;

pub use database::Database;
pub use models::*;
pub use token_store::SqliteTokenStore;
