//! Repository for the `users` table.

use buildcrm_core::pagination::PageRequest;
use buildcrm_core::status::{Role, UserStatus};
use buildcrm_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User};

const COLUMNS: &str = "id, email, first_name, last_name, password_hash, role, status, \
                       last_login_at, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, first_name, last_name, password_hash, role)
             VALUES (LOWER($1), $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup used by login.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// One page of users ordered by id, plus the total count. Deleted users
    /// are excluded.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<(Vec<User>, i64), sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE status <> 'deleted'
             ORDER BY id ASC LIMIT $1 OFFSET $2"
        );
        tokio::try_join!(
            sqlx::query_as::<_, User>(&query)
                .bind(page.limit)
                .bind(page.offset())
                .fetch_all(pool),
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE status <> 'deleted'")
                .fetch_one(pool),
        )
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                email = COALESCE(LOWER($2), email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                role = COALESCE($5, role),
                status = COALESCE($6, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.role.map(Role::as_str))
            .bind(input.status.map(UserStatus::as_str))
            .fetch_optional(pool)
            .await
    }

    /// Mark a user inactive. Returns `true` if the row was changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET status = 'inactive' WHERE id = $1 AND status = 'active'")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
