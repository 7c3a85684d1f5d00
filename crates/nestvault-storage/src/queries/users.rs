// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KDF material owned by the identity service.
//!
//! The vault only reads `password_hash`; the writers here exist for the
//! identity side of the contract and for test setup.

use nestvault_core::{UserId, VaultError};
use rusqlite::params;
use secrecy::SecretString;

use crate::database::{classify, map_tr_err, Database, Violation};
use crate::models::KdfMaterial;

/// Register a user with their initial password hash and salt.
pub async fn insert_user(
    db: &Database,
    user_id: &UserId,
    password_hash: &str,
    salt: &[u8],
) -> Result<(), VaultError> {
    let user_id = user_id.to_string();
    let password_hash = password_hash.to_string();
    let salt = salt.to_vec();
    db.connection()
        .call(move |conn| {
            classify(conn.execute(
                "INSERT INTO users (user_id, password_hash, salt) VALUES (?1, ?2, ?3)",
                params![user_id, password_hash, salt],
            ))
        })
        .await
        .map_err(map_tr_err)?
        .map(|_| ())
        .map_err(|v| match v {
            Violation::Unique => VaultError::Conflict("user already exists".to_string()),
            Violation::ForeignKey => VaultError::Internal("unexpected foreign key on users".into()),
        })
}

/// Fetch the current password hash and salt for a user.
pub async fn kdf_material(db: &Database, user_id: &UserId) -> Result<KdfMaterial, VaultError> {
    let user_id = user_id.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT password_hash, salt FROM users WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
            );
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    let (password_hash, salt) = row.ok_or(VaultError::NotFound {
        entity: "KDF material",
    })?;
    Ok(KdfMaterial {
        password_hash: SecretString::from(password_hash),
        salt,
    })
}

/// Replace a user's password hash after a password change. The salt stays.
pub async fn update_password_hash(
    db: &Database,
    user_id: &UserId,
    password_hash: &str,
) -> Result<(), VaultError> {
    let user_id = user_id.to_string();
    let password_hash = password_hash.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE user_id = ?2",
                params![password_hash, user_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(VaultError::NotFound { entity: "user" });
    }
    Ok(())
}
