// SPDX-FileCopyrightText: 2026 NestVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Category CRUD operations.

use nestvault_core::{CategoryId, PageRequest, UserId, VaultError};
use rusqlite::params;

use crate::database::{classify, map_tr_err, Database, Violation};
use crate::models::{uuid_column, Category};

const SELECT_COLUMNS: &str = "SELECT category_id, user_id, name, description FROM categories";

fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        category_id: CategoryId(uuid_column(row, 0)?),
        user_id: UserId(uuid_column(row, 1)?),
        name: row.get(2)?,
        description: row.get(3)?,
    })
}

fn write_error(v: Violation, name: &str) -> VaultError {
    match v {
        Violation::Unique => VaultError::Conflict(format!("category `{name}` already exists")),
        Violation::ForeignKey => VaultError::NotFound { entity: "user" },
    }
}

/// Create a category. Names are unique per user.
pub async fn insert_category(db: &Database, category: &Category) -> Result<(), VaultError> {
    let c = category.clone();
    db.connection()
        .call(move |conn| {
            classify(conn.execute(
                "INSERT INTO categories (category_id, user_id, name, description)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    c.category_id.to_string(),
                    c.user_id.to_string(),
                    c.name,
                    c.description,
                ],
            ))
        })
        .await
        .map_err(map_tr_err)?
        .map(|_| ())
        .map_err(|v| write_error(v, &category.name))
}

async fn fetch_one(
    db: &Database,
    sql: String,
    user_id: String,
    key: String,
) -> Result<Category, VaultError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(&sql, params![user_id, key], row_to_category);
            match result {
                Ok(category) => Ok(Some(category)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?
        .ok_or(VaultError::NotFound { entity: "category" })
}

/// Fetch a category by id within the user's scope.
pub async fn get_category(
    db: &Database,
    user_id: &UserId,
    category_id: &CategoryId,
) -> Result<Category, VaultError> {
    fetch_one(
        db,
        format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND category_id = ?2"),
        user_id.to_string(),
        category_id.to_string(),
    )
    .await
}

/// Fetch a category by its per-user unique name.
pub async fn get_category_by_name(
    db: &Database,
    user_id: &UserId,
    name: &str,
) -> Result<Category, VaultError> {
    fetch_one(
        db,
        format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND name = ?2"),
        user_id.to_string(),
        name.to_string(),
    )
    .await
}

/// Keyset-paginated listing ordered by category id.
pub async fn list_categories(
    db: &Database,
    user_id: &UserId,
    page: PageRequest,
) -> Result<Vec<Category>, VaultError> {
    page.validate()?;
    let user_id = user_id.to_string();
    let cursor = page.cursor.lower_bound().to_string();
    let limit = page.limit;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 AND category_id > ?2
                 ORDER BY category_id ASC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![user_id, cursor, limit], row_to_category)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Rename or re-describe a category.
pub async fn update_category(db: &Database, category: &Category) -> Result<(), VaultError> {
    let c = category.clone();
    let updated = db
        .connection()
        .call(move |conn| {
            classify(conn.execute(
                "UPDATE categories SET name = ?1, description = ?2
                 WHERE category_id = ?3 AND user_id = ?4",
                params![
                    c.name,
                    c.description,
                    c.category_id.to_string(),
                    c.user_id.to_string(),
                ],
            ))
        })
        .await
        .map_err(map_tr_err)?
        .map_err(|v| write_error(v, &category.name))?;
    if updated == 0 {
        return Err(VaultError::NotFound { entity: "category" });
    }
    Ok(())
}

/// Delete a category and, through the cascade, every credential in it.
///
/// Returns the number of credentials removed with it.
pub async fn delete_category(
    db: &Database,
    user_id: &UserId,
    category_id: &CategoryId,
) -> Result<usize, VaultError> {
    let user_id = user_id.to_string();
    let category_id = category_id.to_string();
    let (deleted, cascaded) = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let cascaded: i64 = tx.query_row(
                "SELECT COUNT(*) FROM passwords WHERE user_id = ?1 AND category_id = ?2",
                params![user_id, category_id],
                |row| row.get(0),
            )?;
            let deleted = tx.execute(
                "DELETE FROM categories WHERE user_id = ?1 AND category_id = ?2",
                params![user_id, category_id],
            )?;
            tx.commit()?;
            Ok((deleted, cascaded))
        })
        .await
        .map_err(map_tr_err)?;
    if deleted == 0 {
        return Err(VaultError::NotFound { entity: "category" });
    }
    Ok(usize::try_from(cascaded).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use nestvault_core::{KeyId, PasswordId};

    use super::*;
    use crate::queries::credentials;
    use crate::queries::fixtures;

    #[tokio::test]
    async fn lookup_by_id_and_name() {
        let db = Database::open_in_memory().await.unwrap();
        let user = fixtures::user(&db).await;
        let banking = fixtures::category(&db, &user, "banking").await;

        assert_eq!(get_category(&db, &user, &banking.category_id).await.unwrap(), banking);
        assert_eq!(get_category_by_name(&db, &user, "banking").await.unwrap(), banking);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts_per_user_only() {
        let db = Database::open_in_memory().await.unwrap();
        let alice = fixtures::user(&db).await;
        let bob = fixtures::user(&db).await;
        fixtures::category(&db, &alice, "email").await;

        let dup = Category {
            category_id: CategoryId::generate(),
            user_id: alice,
            name: "email".into(),
            description: String::new(),
        };
        let err = insert_category(&db, &dup).await.unwrap_err();
        assert!(matches!(err, VaultError::Conflict(_)));

        // Same name under another user is fine.
        fixtures::category(&db, &bob, "email").await;
    }

    #[tokio::test]
    async fn category_for_unknown_user_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let orphan = Category {
            category_id: CategoryId::generate(),
            user_id: UserId(uuid::Uuid::now_v7()),
            name: "x".into(),
            description: String::new(),
        };
        let err = insert_category(&db, &orphan).await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound { entity: "user" }));
    }

    #[tokio::test]
    async fn rename_onto_existing_name_conflicts() {
        let db = Database::open_in_memory().await.unwrap();
        let user = fixtures::user(&db).await;
        fixtures::category(&db, &user, "work").await;
        let mut home = fixtures::category(&db, &user, "home").await;

        home.name = "work".into();
        let err = update_category(&db, &home).await.unwrap_err();
        assert!(matches!(err, VaultError::Conflict(_)));

        home.name = "house".into();
        update_category(&db, &home).await.unwrap();
        assert_eq!(get_category(&db, &user, &home.category_id).await.unwrap().name, "house");
    }

    #[tokio::test]
    async fn list_pages_through_categories() {
        let db = Database::open_in_memory().await.unwrap();
        let user = fixtures::user(&db).await;
        for name in ["a", "b", "c"] {
            fixtures::category(&db, &user, name).await;
        }

        let first = list_categories(&db, &user, PageRequest::first(2)).await.unwrap();
        assert_eq!(first.len(), 2);
        let rest = list_categories(&db, &user, PageRequest::after(first[1].category_id, 2))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "c");
    }

    #[tokio::test]
    async fn delete_cascades_to_credentials() {
        let db = Database::open_in_memory().await.unwrap();
        let user = fixtures::user(&db).await;
        let cat = fixtures::category(&db, &user, "social").await;
        let keep = fixtures::category(&db, &user, "keep").await;
        let key = KeyId([1u8; 16]);
        for _ in 0..3 {
            credentials::insert_credential(&db, &fixtures::record(&user, &cat.category_id, key))
                .await
                .unwrap();
        }
        let survivor = fixtures::record(&user, &keep.category_id, key);
        credentials::insert_credential(&db, &survivor).await.unwrap();

        let removed = delete_category(&db, &user, &cat.category_id).await.unwrap();
        assert_eq!(removed, 3);

        let remaining = credentials::list_all_credentials(&db, &user).await.unwrap();
        let ids: Vec<PasswordId> = remaining.iter().map(|r| r.password_id).collect();
        assert_eq!(ids, vec![survivor.password_id]);
    }

    #[tokio::test]
    async fn delete_in_other_tenant_scope_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let alice = fixtures::user(&db).await;
        let bob = fixtures::user(&db).await;
        let cat = fixtures::category(&db, &alice, "private").await;

        let err = delete_category(&db, &bob, &cat.category_id).await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound { .. }));
        assert!(get_category(&db, &alice, &cat.category_id).await.is_ok());
    }
}
