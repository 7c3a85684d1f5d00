// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.
//!
//! Every statement carries the owning `user_id` in its WHERE clause; callers
//! cannot reach another tenant's rows through these functions.

pub mod categories;
pub mod credentials;
pub mod users;
