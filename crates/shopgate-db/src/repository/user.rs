//! # User Repository
//!
//! Every read selects `id, name, email` only. The `password` column is
//! written by [`UserRepository::insert`] and [`UserRepository::update`] and
//! read back only by [`UserRepository::password_hash`].

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::patch::StoredUserPatch;
use shopgate_core::User;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID (without credentials).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists every user (without credentials), ordered by id.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Inserts a user. `password_hash` must already be hashed.
    pub async fn insert(&self, user: &User, password_hash: Option<&str>) -> DbResult<()> {
        debug!(id = %user.id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a prepared patch.
    ///
    /// Builds `UPDATE users SET <only the supplied columns> WHERE id = ?`
    /// with every value bound as a parameter. Column names come from
    /// [`StoredUserPatch::fields`], never from caller input.
    ///
    /// ## Returns
    /// Whether a row was updated (`false` when the user does not exist).
    pub async fn update(&self, patch: &StoredUserPatch) -> DbResult<bool> {
        if patch.fields.is_empty() {
            return Ok(false);
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut assignments = builder.separated(", ");
            for (column, value) in &patch.fields {
                assignments.push(format!("{column} = "));
                assignments.push_bind_unseparated(value.as_str());
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(patch.id.as_str());

        let result = builder.build().execute(&self.pool).await?;

        debug!(
            id = %patch.id,
            fields = ?patch.field_names(),
            updated = result.rows_affected(),
            "Updated user"
        );
        Ok(result.rows_affected() > 0)
    }

    /// Returns the stored credential hash, if any.
    pub async fn password_hash(&self, id: &str) -> DbResult<Option<String>> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(hash.flatten())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::patch::verify_password;
    use crate::pool::{Database, DbConfig};
    use shopgate_core::UserPatchRequest;

    use super::*;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users()
            .insert(
                &User {
                    id: "u1".to_string(),
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                },
                Some("not-a-real-hash"),
            )
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_update_only_touches_supplied_columns() {
        let db = setup().await;
        let patch = StoredUserPatch::prepare(&UserPatchRequest::new("u1").name("Bob"))
            .unwrap()
            .unwrap();

        assert!(db.users().update(&patch).await.unwrap());

        let user = db.users().get_by_id("u1").await.unwrap().unwrap();
        assert_eq!(user.name, "Bob");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(
            db.users().password_hash("u1").await.unwrap().as_deref(),
            Some("not-a-real-hash")
        );
    }

    #[tokio::test]
    async fn test_update_password_stores_hash() {
        let db = setup().await;
        let patch = StoredUserPatch::prepare(&UserPatchRequest::new("u1").password("s3cret"))
            .unwrap()
            .unwrap();

        db.users().update(&patch).await.unwrap();

        let hash = db.users().password_hash("u1").await.unwrap().unwrap();
        assert!(verify_password("s3cret", &hash));
    }

    #[tokio::test]
    async fn test_update_unknown_user_changes_nothing() {
        let db = setup().await;
        let patch = StoredUserPatch::prepare(&UserPatchRequest::new("u9").name("Ghost"))
            .unwrap()
            .unwrap();

        assert!(!db.users().update(&patch).await.unwrap());
        assert!(db.users().get_by_id("u9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_value_with_quotes_is_bound_not_interpolated() {
        let db = setup().await;
        let patch = StoredUserPatch::prepare(
            &UserPatchRequest::new("u1").name(r#"Robert"); DROP TABLE users; --"#),
        )
        .unwrap()
        .unwrap();

        db.users().update(&patch).await.unwrap();

        let user = db.users().get_by_id("u1").await.unwrap().unwrap();
        assert_eq!(user.name, r#"Robert"); DROP TABLE users; --"#);
    }
}
