// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits at the seams where the vault meets its external collaborators.

pub mod token_store;

pub use token_store::{rotation_token_key, TokenStore, ROTATION_TOKEN_PREFIX};
