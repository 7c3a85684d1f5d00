// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user credential encryption and key rotation for NestVault.
//!
//! Each user's credentials are sealed with AES-256-GCM under a key derived
//! (PBKDF2-HMAC-SHA256) from their current password hash, their id, and a
//! per-user salt. When the password changes, [`RotationCoordinator`]
//! re-seals the vault under the new key using the previous hash stashed in a
//! short-lived [`TokenStore`](nestvault_core::TokenStore) entry.

pub mod cipher;
pub mod crypto;
pub mod kdf;
pub mod keys;
pub mod memory_store;
pub mod prompt;
pub mod rotation;
pub mod service;

pub use cipher::CredentialSecret;
pub use keys::DerivedKey;
pub use memory_store::MemoryTokenStore;
pub use prompt::read_previous_secret;
pub use rotation::{RotationCoordinator, RotationReport, RotationSettings, RotationStatus};
pub use service::{Credential, VaultService};
