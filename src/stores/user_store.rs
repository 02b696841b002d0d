//! Credential store: persisted users behind a trait so the auth flow can be
//! exercised without a database.

use async_trait::async_trait;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        pagination::PageWindow,
        user::{NewUser, User},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Insert a user. Fails with `DuplicateEmail`/`DuplicateUsername` when a
    /// unique constraint is hit.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// Replace the stored password hash. Returns `false` if the user is gone.
    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, AppError>;

    /// One page of users ordered by id, optionally filtered by an `ILIKE`
    /// pattern over username and email. Returns the page and the total count.
    async fn list(
        &self,
        pattern: Option<&str>,
        window: PageWindow,
    ) -> Result<(Vec<User>, i64), AppError>;

    async fn delete(&self, id: i32) -> Result<bool, AppError>;
}

/// Postgres-backed [`UserStore`] over the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, email, password, role, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                if db.constraint() == Some("users_email_key") {
                    Err(AppError::DuplicateEmail)
                } else {
                    Err(AppError::DuplicateUsername)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        pattern: Option<&str>,
        window: PageWindow,
    ) -> Result<(Vec<User>, i64), AppError> {
        let filter = "($1::text IS NULL OR username ILIKE $1 OR email ILIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {filter}"))
            .bind(pattern)
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {filter} ORDER BY id ASC LIMIT $2 OFFSET $3"
        ))
        .bind(pattern)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

