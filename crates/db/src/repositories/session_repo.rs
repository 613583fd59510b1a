//! Repository for the `user_sessions` table.
//!
//! A refresh token buys exactly one exchange. [`SessionRepo::rotate`] spends
//! the presented session and inserts its successor in a single statement,
//! so two concurrent exchanges of one token cannot both succeed. Spent rows
//! stay until they expire, which is what lets a replay be recognised.

use buildcrm_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{NewRefreshToken, Rotation, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, revoked_at, created_at";

pub struct SessionRepo;

impl SessionRepo {
    /// Open a session for a user who just logged in.
    pub async fn issue(
        pool: &PgPool,
        user_id: DbId,
        token: &NewRefreshToken,
    ) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .bind(&token.refresh_token_hash)
            .bind(token.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Spend the session behind `presented_hash` and replace it with `next`.
    pub async fn rotate(
        pool: &PgPool,
        presented_hash: &str,
        next: &NewRefreshToken,
    ) -> Result<Rotation, sqlx::Error> {
        let query = format!(
            "WITH spent AS (
                UPDATE user_sessions SET revoked_at = NOW()
                WHERE refresh_token_hash = $1
                  AND revoked_at IS NULL
                  AND expires_at > NOW()
                RETURNING user_id
             )
             INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at)
             SELECT user_id, $2, $3 FROM spent
             RETURNING {COLUMNS}"
        );
        let rotated = sqlx::query_as::<_, UserSession>(&query)
            .bind(presented_hash)
            .bind(&next.refresh_token_hash)
            .bind(next.expires_at)
            .fetch_optional(pool)
            .await?;
        if let Some(session) = rotated {
            return Ok(Rotation::Rotated(session));
        }

        let spent_by: Option<DbId> = sqlx::query_scalar(
            "SELECT user_id FROM user_sessions
             WHERE refresh_token_hash = $1
               AND revoked_at IS NOT NULL
               AND expires_at > NOW()",
        )
        .bind(presented_hash)
        .fetch_optional(pool)
        .await?;

        Ok(match spent_by {
            Some(user_id) => Rotation::Replayed { user_id },
            None => Rotation::Rejected,
        })
    }

    /// End every live session of a user. Returns how many were ended.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Drop sessions past their expiry, spent or not.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
