// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the NestVault credential vault.
//!
//! This crate provides the error taxonomy, identifier and pagination types,
//! and the collaborator traits shared by the storage, vault, and CLI crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VaultError;
pub use traits::{rotation_token_key, TokenStore, ROTATION_TOKEN_PREFIX};
pub use types::{
    CategoryId, CategoryKey, Cursor, KeyId, PageRequest, PasswordId, UserId, KEY_ID_LEN,
    MAX_PAGE_SIZE,
};
