//! Handlers for user administration (`/users`). All require `ManageUsers`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use buildcrm_core::client::validate_email;
use buildcrm_core::error::CoreError;
use buildcrm_core::pagination::Pagination;
use buildcrm_core::status::{Role, UserStatus};
use buildcrm_core::types::DbId;
use buildcrm_db::models::user::{CreateUser, UpdateUser, UserResponse};
use buildcrm_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidQuery};
use crate::middleware::rbac::RequireManageUsers;
use crate::query::PageParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Employee
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    RequireManageUsers(_admin): RequireManageUsers,
    ValidQuery(params): ValidQuery<PageParams>,
) -> AppResult<Json<DataResponse<UserListResponse>>> {
    let page = params.page_request();
    let (users, total) = UserRepo::list(&state.pool, page).await?;
    Ok(Json(DataResponse {
        data: UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            pagination: Pagination::new(page, total),
        },
    }))
}

/// POST /api/v1/users
pub async fn create(
    State(state): State<AppState>,
    RequireManageUsers(admin): RequireManageUsers,
    ValidJson(input): ValidJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserEnvelope>>)> {
    validate_email(&input.email)?;
    validate_person_name(&input.first_name, &input.last_name)?;
    validate_password_strength(&input.password)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            password_hash,
            role: input.role,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %user.role, admin_id = admin.user_id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserEnvelope { user: user.into() },
        }),
    ))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireManageUsers(_admin): RequireManageUsers,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserEnvelope>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    Ok(Json(DataResponse {
        data: UserEnvelope { user: user.into() },
    }))
}

/// PUT /api/v1/users/{id}
///
/// Changing a user's role or status revokes their refresh tokens so the new
/// permissions apply from the next login.
pub async fn update(
    State(state): State<AppState>,
    RequireManageUsers(admin): RequireManageUsers,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateUser>,
) -> AppResult<Json<DataResponse<UserEnvelope>>> {
    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    if id == admin.user_id
        && (input.role.is_some_and(|r| r != Role::Admin)
            || input.status.is_some_and(|s| s != UserStatus::Active))
    {
        return Err(AppError::BadRequest(
            "Administrators cannot demote or deactivate themselves".into(),
        ));
    }

    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    if input.role.is_some() || input.status.is_some() {
        SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    }
    Ok(Json(DataResponse {
        data: UserEnvelope { user: user.into() },
    }))
}

/// DELETE /api/v1/users/{id}
///
/// Deactivates the account and revokes its sessions. The row is kept.
pub async fn deactivate(
    State(state): State<AppState>,
    RequireManageUsers(admin): RequireManageUsers,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::BadRequest(
            "Administrators cannot deactivate themselves".into(),
        ));
    }

    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    tracing::info!(user_id = id, admin_id = admin.user_id, revoked, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_person_name(first: &str, last: &str) -> Result<(), CoreError> {
    if first.trim().is_empty() || last.trim().is_empty() {
        return Err(CoreError::Validation(
            "First and last name are required".into(),
        ));
    }
    Ok(())
}
