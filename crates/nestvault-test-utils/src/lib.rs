// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for NestVault integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - temp database, seeded users, service and coordinator
//! - [`FlakyTokenStore`] - token store with switchable failures

pub mod harness;
pub mod mock_token_store;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_token_store::FlakyTokenStore;
