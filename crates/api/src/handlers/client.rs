//! Handlers for the `/clients` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use buildcrm_core::client::{
    validate_company_name, validate_email, validate_estimated_value, validate_rating,
};
use buildcrm_core::error::CoreError;
use buildcrm_core::pagination::Pagination;
use buildcrm_core::status::ClientStatus;
use buildcrm_core::types::{DbId, Money};
use buildcrm_db::models::client::{Client, ClientView, CreateClient, UpdateClient};
use buildcrm_db::repositories::ClientRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidQuery};
use crate::middleware::auth::Session;
use crate::middleware::rbac::{RequireDeleteClients, RequireManageClients};
use crate::query::ClientListParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClientListResponse {
    pub clients: Vec<ClientView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub client: ClientView,
}

/// Request body for `PATCH /clients/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ClientStatus,
}

fn client_response(client: Client) -> Json<DataResponse<ClientResponse>> {
    Json(DataResponse {
        data: ClientResponse {
            client: ClientView::from(client),
        },
    })
}

/// GET /api/v1/clients
pub async fn list(
    State(state): State<AppState>,
    _session: Session,
    ValidQuery(params): ValidQuery<ClientListParams>,
) -> AppResult<Json<DataResponse<ClientListResponse>>> {
    let (filters, sort, page) = params.into_parts();
    let (clients, total) = ClientRepo::list(&state.pool, &filters, sort, page).await?;

    Ok(Json(DataResponse {
        data: ClientListResponse {
            clients: clients.into_iter().map(ClientView::from).collect(),
            pagination: Pagination::new(page, total),
        },
    }))
}

/// GET /api/v1/clients/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ClientResponse>>> {
    let client = ClientRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Client", id))?;
    Ok(client_response(client))
}

/// POST /api/v1/clients
pub async fn create(
    State(state): State<AppState>,
    RequireManageClients(session): RequireManageClients,
    ValidJson(input): ValidJson<CreateClient>,
) -> AppResult<(StatusCode, Json<DataResponse<ClientResponse>>)> {
    validate_company_name(&input.company_name)?;
    validate_fields(input.email.as_deref(), input.rating, input.estimated_value)?;

    let client = ClientRepo::create(&state.pool, &input).await?;
    tracing::info!(client_id = client.id, user_id = session.user_id, "Client created");
    Ok((StatusCode::CREATED, client_response(client)))
}

/// PUT /api/v1/clients/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireManageClients(_session): RequireManageClients,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateClient>,
) -> AppResult<Json<DataResponse<ClientResponse>>> {
    if let Some(name) = &input.company_name {
        validate_company_name(name)?;
    }
    validate_fields(input.email.as_deref(), input.rating, input.estimated_value)?;

    let client = ClientRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Client", id))?;
    Ok(client_response(client))
}

/// PATCH /api/v1/clients/{id}/status
///
/// Client stages move freely; there is no lifecycle table for clients.
pub async fn update_status(
    State(state): State<AppState>,
    RequireManageClients(session): RequireManageClients,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<StatusUpdate>,
) -> AppResult<Json<DataResponse<ClientResponse>>> {
    let client = ClientRepo::update_status(&state.pool, id, input.status)
        .await?
        .ok_or(AppError::not_found("Client", id))?;
    tracing::info!(
        client_id = id,
        status = %client.status,
        user_id = session.user_id,
        "Client status changed"
    );
    Ok(client_response(client))
}

/// DELETE /api/v1/clients/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireDeleteClients(session): RequireDeleteClients,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ClientRepo::delete(&state.pool, id).await? {
        tracing::info!(client_id = id, user_id = session.user_id, "Client deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Client", id))
    }
}

fn validate_fields(
    email: Option<&str>,
    rating: Option<i16>,
    estimated_value: Option<Money>,
) -> Result<(), CoreError> {
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        validate_email(email)?;
    }
    if let Some(rating) = rating {
        validate_rating(rating)?;
    }
    if let Some(value) = estimated_value {
        validate_estimated_value(value)?;
    }
    Ok(())
}
