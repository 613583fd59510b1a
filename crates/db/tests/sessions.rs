//! Integration tests for refresh-token rotation.

use assert_matches::assert_matches;
use buildcrm_core::status::Role;
use buildcrm_db::models::session::{NewRefreshToken, Rotation};
use buildcrm_db::models::user::CreateUser;
use buildcrm_db::repositories::{SessionRepo, UserRepo};
use chrono::{Duration, Utc};
use sqlx::PgPool;

async fn user_id(pool: &PgPool) -> i64 {
    let input = CreateUser {
        email: "rotation@buildcrm.test".to_string(),
        first_name: "Rota".to_string(),
        last_name: "Tion".to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role: Role::Employee,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

fn token(hash: &str, ttl: Duration) -> NewRefreshToken {
    NewRefreshToken {
        refresh_token_hash: hash.to_string(),
        expires_at: Utc::now() + ttl,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rotate_spends_token_once(pool: PgPool) {
    let owner = user_id(&pool).await;
    SessionRepo::issue(&pool, owner, &token("h1", Duration::days(7)))
        .await
        .unwrap();

    let first = SessionRepo::rotate(&pool, "h1", &token("h2", Duration::days(7)))
        .await
        .unwrap();
    assert_matches!(first, Rotation::Rotated(ref s) if s.user_id == owner && s.refresh_token_hash == "h2");

    let again = SessionRepo::rotate(&pool, "h1", &token("h3", Duration::days(7)))
        .await
        .unwrap();
    assert_matches!(again, Rotation::Replayed { user_id } if user_id == owner);

    // The successor is still live until someone revokes it.
    let next = SessionRepo::rotate(&pool, "h2", &token("h4", Duration::days(7)))
        .await
        .unwrap();
    assert_matches!(next, Rotation::Rotated(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rotate_rejects_unknown_and_expired(pool: PgPool) {
    let owner = user_id(&pool).await;
    SessionRepo::issue(&pool, owner, &token("old", -Duration::minutes(1)))
        .await
        .unwrap();

    let unknown = SessionRepo::rotate(&pool, "nope", &token("x1", Duration::days(7)))
        .await
        .unwrap();
    assert_matches!(unknown, Rotation::Rejected);

    let expired = SessionRepo::rotate(&pool, "old", &token("x2", Duration::days(7)))
        .await
        .unwrap();
    assert_matches!(expired, Rotation::Rejected);

    assert_eq!(SessionRepo::purge_expired(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revoke_all_blocks_rotation(pool: PgPool) {
    let owner = user_id(&pool).await;
    SessionRepo::issue(&pool, owner, &token("a", Duration::days(7))).await.unwrap();
    SessionRepo::issue(&pool, owner, &token("b", Duration::days(7))).await.unwrap();

    assert_eq!(SessionRepo::revoke_all_for_user(&pool, owner).await.unwrap(), 2);

    let result = SessionRepo::rotate(&pool, "a", &token("c", Duration::days(7)))
        .await
        .unwrap();
    assert_matches!(result, Rotation::Replayed { .. });
}
