// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ciphertext record CRUD, keyset pagination, and rotation writes.

use nestvault_core::{CategoryId, KeyId, PageRequest, PasswordId, UserId, VaultError};
use rusqlite::params;

use crate::database::{classify, map_tr_err, Database, Violation};
use crate::models::{key_id_column, uuid_column, CredentialRecord, KeyIdCount};

const SELECT_COLUMNS: &str = "SELECT password_id, user_id, category_id, website, nonce, ciphertext, key_id
     FROM passwords";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
    Ok(CredentialRecord {
        password_id: PasswordId(uuid_column(row, 0)?),
        user_id: UserId(uuid_column(row, 1)?),
        category_id: CategoryId(uuid_column(row, 2)?),
        website: row.get(3)?,
        nonce: row.get(4)?,
        ciphertext: row.get(5)?,
        key_id: key_id_column(row, 6)?,
    })
}

/// One page of a user's credentials, ordered by id.
pub async fn list_credentials(
    db: &Database,
    user_id: &UserId,
    page: PageRequest,
) -> Result<Vec<CredentialRecord>, VaultError> {
    page.validate()?;
    let user_id = user_id.to_string();
    let cursor = page.cursor.lower_bound().to_string();
    let limit = page.limit;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 AND password_id > ?2
                 ORDER BY password_id ASC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![user_id, cursor, limit], row_to_record)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// One page of a user's credentials within a single category.
pub async fn list_credentials_by_category(
    db: &Database,
    user_id: &UserId,
    category_id: &CategoryId,
    page: PageRequest,
) -> Result<Vec<CredentialRecord>, VaultError> {
    page.validate()?;
    let user_id = user_id.to_string();
    let category_id = category_id.to_string();
    let cursor = page.cursor.lower_bound().to_string();
    let limit = page.limit;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 AND category_id = ?2 AND password_id > ?3
                 ORDER BY password_id ASC LIMIT ?4"
            ))?;
            let rows = stmt.query_map(
                params![user_id, category_id, cursor, limit],
                row_to_record,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Every credential the user owns, unpaginated. Rotation input.
pub async fn list_all_credentials(
    db: &Database,
    user_id: &UserId,
) -> Result<Vec<CredentialRecord>, VaultError> {
    list_credentials(db, user_id, PageRequest::unbounded()).await
}

/// Fetch one credential by its full identity.
pub async fn get_credential(
    db: &Database,
    user_id: &UserId,
    category_id: &CategoryId,
    password_id: &PasswordId,
) -> Result<CredentialRecord, VaultError> {
    let user_id = user_id.to_string();
    let category_id = category_id.to_string();
    let password_id = password_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "{SELECT_COLUMNS} WHERE password_id = ?1 AND category_id = ?2 AND user_id = ?3"
                ),
                params![password_id, category_id, user_id],
                row_to_record,
            );
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?
        .ok_or(VaultError::NotFound {
            entity: "credential",
        })
}

/// Persist a new credential.
///
/// A category that does not exist in the user's scope is `NotFound`.
pub async fn insert_credential(db: &Database, record: &CredentialRecord) -> Result<(), VaultError> {
    let r = record.clone();
    db.connection()
        .call(move |conn| {
            classify(conn.execute(
                "INSERT INTO passwords
                 (password_id, user_id, category_id, website, nonce, ciphertext, key_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    r.password_id.to_string(),
                    r.user_id.to_string(),
                    r.category_id.to_string(),
                    r.website,
                    r.nonce,
                    r.ciphertext,
                    r.key_id.as_bytes(),
                ],
            ))
        })
        .await
        .map_err(map_tr_err)?
        .map(|_| ())
        .map_err(|v| match v {
            Violation::ForeignKey => VaultError::NotFound { entity: "category" },
            Violation::Unique => {
                VaultError::Conflict(format!("credential {} already exists", record.password_id))
            }
        })
}

/// Overwrite an existing credential's label and sealed payload.
pub async fn replace_credential(
    db: &Database,
    record: &CredentialRecord,
) -> Result<(), VaultError> {
    let r = record.clone();
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE passwords
                 SET website = ?1, nonce = ?2, ciphertext = ?3, key_id = ?4,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE password_id = ?5 AND category_id = ?6 AND user_id = ?7",
                params![
                    r.website,
                    r.nonce,
                    r.ciphertext,
                    r.key_id.as_bytes(),
                    r.password_id.to_string(),
                    r.category_id.to_string(),
                    r.user_id.to_string(),
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(VaultError::NotFound {
            entity: "credential",
        });
    }
    Ok(())
}

/// Rewrite a batch of re-sealed records in one transaction.
///
/// Each row is only replaced while it is still sealed under `expected`, so a
/// record the user rewrote since it was read is left alone. Returns how many
/// rows were actually replaced.
pub async fn replace_chunk(
    db: &Database,
    records: Vec<CredentialRecord>,
    expected: KeyId,
) -> Result<usize, VaultError> {
    if records.is_empty() {
        return Ok(0);
    }
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut replaced = 0;
            {
                let mut stmt = tx.prepare(
                    "UPDATE passwords
                     SET nonce = ?1, ciphertext = ?2, key_id = ?3,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE password_id = ?4 AND user_id = ?5 AND key_id = ?6",
                )?;
                for r in &records {
                    replaced += stmt.execute(params![
                        r.nonce,
                        r.ciphertext,
                        r.key_id.as_bytes(),
                        r.password_id.to_string(),
                        r.user_id.to_string(),
                        expected.as_bytes(),
                    ])?;
                }
            }
            tx.commit()?;
            Ok(replaced)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete one credential.
pub async fn delete_credential(
    db: &Database,
    user_id: &UserId,
    category_id: &CategoryId,
    password_id: &PasswordId,
) -> Result<(), VaultError> {
    let user_id = user_id.to_string();
    let category_id = category_id.to_string();
    let password_id = password_id.to_string();
    let deleted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM passwords WHERE password_id = ?1 AND category_id = ?2 AND user_id = ?3",
                params![password_id, category_id, user_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if deleted == 0 {
        return Err(VaultError::NotFound {
            entity: "credential",
        });
    }
    Ok(())
}

/// How many of the user's credentials are sealed under each key.
pub async fn key_id_counts(db: &Database, user_id: &UserId) -> Result<Vec<KeyIdCount>, VaultError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key_id, COUNT(*) FROM passwords WHERE user_id = ?1
                 GROUP BY key_id ORDER BY key_id",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(KeyIdCount {
                    key_id: key_id_column(row, 0)?,
                    count: row.get::<_, i64>(1)?.max(0) as u64,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}
