//! HTTP-level integration tests for the auth and user administration
//! endpoints.
//!
//! Tests cover login, token refresh with rotation, logout, the session
//! extractor, and capability enforcement on `/users`.

mod common;

use axum::http::StatusCode;
use buildcrm_core::status::Role;
use buildcrm_db::repositories::UserRepo;
use common::{
    body_json, create_user, delete_auth, get, get_auth, post_json, post_json_auth, put_json_auth,
    user_with_token, TEST_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Log in via the API and return the `data` object of the response.
async fn login(app: axum::Router, email: &str, password: &str) -> serde_json::Value {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_user(&pool, "site.lead@buildcrm.test", Role::Manager).await;
    let app = common::build_test_app(pool);

    let data = login(app, "site.lead@buildcrm.test", TEST_PASSWORD).await;

    assert!(data["token"].is_string());
    assert!(data["refreshToken"].is_string());
    assert_eq!(data["expiresIn"], 900);
    assert_eq!(data["user"]["id"], user.id);
    assert_eq!(data["user"]["role"], "manager");
    assert_eq!(data["user"]["capabilities"]["manageProjects"], true);
    assert_eq!(data["user"]["capabilities"]["manageUsers"], false);
    assert!(data["user"].get("passwordHash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_email_is_case_insensitive(pool: PgPool) {
    create_user(&pool, "Mixed.Case@BuildCRM.test", Role::Employee).await;
    let app = common::build_test_app(pool);

    let data = login(app, "mixed.case@buildcrm.test", TEST_PASSWORD).await;
    assert_eq!(data["user"]["email"], "mixed.case@buildcrm.test");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    create_user(&pool, "wrongpw@buildcrm.test", Role::Employee).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "wrongpw@buildcrm.test", "password": "incorrect_password" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_nonexistent_user(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "ghost@buildcrm.test", "password": "whatever" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_inactive_user(pool: PgPool) {
    let user = create_user(&pool, "inactive@buildcrm.test", Role::Employee).await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "inactive@buildcrm.test", "password": TEST_PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_malformed_body_is_json_400(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/auth/login", json!({ "email": "x" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Refresh and logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_rotates_token(pool: PgPool) {
    create_user(&pool, "refresher@buildcrm.test", Role::Employee).await;

    let data = login(
        common::build_test_app(pool.clone()),
        "refresher@buildcrm.test",
        TEST_PASSWORD,
    )
    .await;
    let refresh_token = data["refreshToken"].as_str().unwrap().to_string();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/refresh",
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["token"].is_string());
    assert_ne!(json["data"]["refreshToken"], refresh_token.as_str());

    // The old token was consumed by the exchange.
    let replay = post_json(
        common::build_test_app(pool),
        "/api/v1/auth/refresh",
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replayed_refresh_token_ends_successor_session(pool: PgPool) {
    create_user(&pool, "replay@buildcrm.test", Role::Employee).await;
    let data = login(
        common::build_test_app(pool.clone()),
        "replay@buildcrm.test",
        TEST_PASSWORD,
    )
    .await;
    let first = data["refreshToken"].as_str().unwrap().to_string();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/refresh",
        json!({ "refreshToken": first }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await["data"]["refreshToken"]
        .as_str()
        .unwrap()
        .to_string();

    let replay = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/refresh",
        json!({ "refreshToken": first }),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    // The replay revoked the session issued by the legitimate exchange too.
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/auth/refresh",
        json!({ "refreshToken": second }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_with_invalid_token(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": "not-a-real-token" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_revokes_refresh_tokens(pool: PgPool) {
    create_user(&pool, "leaver@buildcrm.test", Role::Employee).await;
    let data = login(
        common::build_test_app(pool.clone()),
        "leaver@buildcrm.test",
        TEST_PASSWORD,
    )
    .await;
    let token = data["token"].as_str().unwrap();
    let refresh_token = data["refreshToken"].as_str().unwrap();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/logout",
        json!({}),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/auth/refresh",
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Session extractor
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_requires_bearer_token(pool: PgPool) {
    let (user, token) = user_with_token(&pool, Role::Employee).await;

    let response = get(common::build_test_app(pool.clone()), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/auth/me", "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(common::build_test_app(pool), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["id"], user.id);
    assert_eq!(json["data"]["user"]["capabilities"]["viewAllProjects"], false);
}

// ---------------------------------------------------------------------------
// User administration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_users_require_manage_users(pool: PgPool) {
    let (_, manager_token) = user_with_token(&pool, Role::Manager).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/users", &manager_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_creates_and_lists_users(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, Role::Admin).await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/users",
        json!({
            "email": "new.hire@buildcrm.test",
            "firstName": "New",
            "lastName": "Hire",
            "password": "long-enough-password",
        }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["role"], "employee");
    assert_eq!(json["data"]["user"]["status"], "active");

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/users?limit=1",
        &admin_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["users"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["pagination"]["totalItems"], 2);
    assert_eq!(json["data"]["pagination"]["hasNext"], true);

    // Duplicate email hits the unique constraint.
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/users",
        json!({
            "email": "NEW.HIRE@buildcrm.test",
            "firstName": "Again",
            "lastName": "Hire",
            "password": "long-enough-password",
        }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_user_rejects_short_password(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, Role::Admin).await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/users",
        json!({
            "email": "short@buildcrm.test",
            "firstName": "Short",
            "lastName": "Pw",
            "password": "abc",
        }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_change_and_deactivation(pool: PgPool) {
    let (admin, admin_token) = user_with_token(&pool, Role::Admin).await;
    let worker = create_user(&pool, "worker@buildcrm.test", Role::Employee).await;

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/users/{}", worker.id),
        json!({ "role": "manager" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["user"]["role"], "manager");

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/users/{}", worker.id),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Deactivating again finds no active account.
    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/users/{}", worker.id),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/v1/users/{}", admin.id),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
