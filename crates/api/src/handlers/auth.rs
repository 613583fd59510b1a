//! Handlers for the `/auth` resource (login, refresh, logout, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use buildcrm_core::error::CoreError;
use buildcrm_db::models::session::{NewRefreshToken, Rotation};
use buildcrm_db::models::user::{User, UserResponse};
use buildcrm_db::repositories::{SessionRepo, UserRepo};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, hash_refresh_token, JwtConfig,
};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::Session;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
}

fn invalid_refresh_token() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid or expired refresh token".into(),
    ))
}

fn account_deactivated() -> AppError {
    AppError::Core(CoreError::Forbidden("Account is deactivated".into()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid_credentials());
    }

    if !user.is_active() {
        return Err(account_deactivated());
    }

    UserRepo::record_login(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    let jwt = &state.config.jwt;
    let (refresh_token, token) = new_refresh_token(jwt);
    SessionRepo::issue(&state.pool, user.id, &token).await?;

    let response = auth_response(jwt, user, refresh_token)?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for new access + refresh tokens. Each refresh
/// token works once; presenting a spent one ends all of the owner's
/// sessions.
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let jwt = &state.config.jwt;
    let presented = hash_refresh_token(&input.refresh_token);
    let (refresh_token, next) = new_refresh_token(jwt);

    let session = match SessionRepo::rotate(&state.pool, &presented, &next).await? {
        Rotation::Rotated(session) => session,
        Rotation::Replayed { user_id } => {
            let revoked = SessionRepo::revoke_all_for_user(&state.pool, user_id).await?;
            tracing::warn!(user_id, revoked, "Spent refresh token presented, sessions revoked");
            return Err(invalid_refresh_token());
        }
        Rotation::Rejected => return Err(invalid_refresh_token()),
    };

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(invalid_refresh_token)?;

    if !user.is_active() {
        SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;
        return Err(account_deactivated());
    }

    let response = auth_response(jwt, user, refresh_token)?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, session.user_id).await?;
    tracing::info!(user_id = session.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or(AppError::not_found("User", session.user_id))?;
    Ok(Json(DataResponse {
        data: MeResponse { user: user.into() },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A new refresh token: the plaintext for the caller, the hash for storage.
fn new_refresh_token(jwt: &JwtConfig) -> (String, NewRefreshToken) {
    let (plaintext, refresh_token_hash) = generate_refresh_token();
    let token = NewRefreshToken {
        refresh_token_hash,
        expires_at: Utc::now() + chrono::Duration::days(jwt.refresh_token_expiry_days),
    };
    (plaintext, token)
}

fn auth_response(jwt: &JwtConfig, user: User, refresh_token: String) -> AppResult<AuthResponse> {
    let token = generate_access_token(user.id, user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        user: user.into(),
        token,
        refresh_token,
        expires_in: jwt.access_token_expiry_secs(),
    })
}
