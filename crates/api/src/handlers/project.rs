//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use buildcrm_core::error::CoreError;
use buildcrm_core::pagination::Pagination;
use buildcrm_core::project::{
    check_project_dates, check_transition, validate_amount, validate_budget,
    validate_client_satisfaction, validate_name, validate_progress, validate_quality_score,
};
use buildcrm_core::roles::Capability;
use buildcrm_core::status::ProjectStatus;
use buildcrm_core::types::{DbId, Money};
use buildcrm_db::models::project::{CreateProject, Project, ProjectView, UpdateProject};
use buildcrm_db::repositories::ProjectRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidQuery};
use crate::middleware::auth::Session;
use crate::middleware::rbac::{RequireDeleteProjects, RequireManageProjects};
use crate::query::ProjectListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: ProjectView,
}

/// Request body for `PATCH /projects/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ProjectStatus,
}

/// Request body for `PATCH /projects/{id}/progress`.
#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub progress: i32,
}

fn project_response(project: Project) -> Json<DataResponse<ProjectResponse>> {
    Json(DataResponse {
        data: ProjectResponse {
            project: ProjectView::from(project),
        },
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
///
/// Employees only see projects they manage or are a team member of.
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    ValidQuery(params): ValidQuery<ProjectListParams>,
) -> AppResult<Json<DataResponse<ProjectListResponse>>> {
    let (filters, sort, page) = params.into_parts(session.project_scope());
    let (projects, total) = ProjectRepo::list(&state.pool, &filters, sort, page).await?;

    Ok(Json(DataResponse {
        data: ProjectListResponse {
            projects: projects.into_iter().map(ProjectView::from).collect(),
            pagination: Pagination::new(page, total),
        },
    }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    let project = find_visible(&state, &session, id).await?;
    Ok(project_response(project))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    RequireManageProjects(session): RequireManageProjects,
    ValidJson(input): ValidJson<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectResponse>>)> {
    validate_create(&input)?;

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(
        project_id = project.id,
        project_number = %project.project_number,
        user_id = session.user_id,
        "Project created"
    );
    Ok((StatusCode::CREATED, project_response(project)))
}

/// PUT /api/v1/projects/{id}
///
/// Partial update. A status change goes through the same lifecycle check as
/// `PATCH /status`.
pub async fn update(
    State(state): State<AppState>,
    RequireManageProjects(session): RequireManageProjects,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateProject>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    validate_update(&input)?;

    let existing = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Project", id))?;

    check_project_dates(
        input.start_date.or(existing.start_date),
        input.estimated_end_date.or(existing.estimated_end_date),
    )?;
    if let Some(status) = input.status {
        authorize_transition(&session, existing.status, status)?;
    }

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    Ok(project_response(project))
}

/// PATCH /api/v1/projects/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireManageProjects(session): RequireManageProjects,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<StatusUpdate>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    let existing = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Project", id))?;

    authorize_transition(&session, existing.status, input.status)?;

    let project = ProjectRepo::update_status(&state.pool, id, input.status)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    tracing::info!(
        project_id = id,
        from = %existing.status,
        to = %project.status,
        user_id = session.user_id,
        "Project status changed"
    );
    Ok(project_response(project))
}

/// PATCH /api/v1/projects/{id}/progress
///
/// Allowed for project managers and for anyone on the project's team.
pub async fn update_progress(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<ProgressUpdate>,
) -> AppResult<Json<DataResponse<ProjectResponse>>> {
    validate_progress(input.progress)?;

    let existing = find_visible(&state, &session, id).await?;
    if !session.can(Capability::ManageProjects) && !existing.involves(session.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the project team can report progress".into(),
        )));
    }

    let project = ProjectRepo::update_progress(&state.pool, id, input.progress)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    Ok(project_response(project))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireDeleteProjects(session): RequireDeleteProjects,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ProjectRepo::delete(&state.pool, id).await?;
    if deleted {
        tracing::info!(project_id = id, user_id = session.user_id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Project", id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a project the session may see. Projects outside an employee's scope
/// are reported as missing.
async fn find_visible(state: &AppState, session: &Session, id: DbId) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Project", id))?;

    match session.project_scope() {
        Some(user_id) if !project.involves(user_id) => Err(AppError::not_found("Project", id)),
        _ => Ok(project),
    }
}

/// Lifecycle check, skipped for roles that may override status.
fn authorize_transition(
    session: &Session,
    from: ProjectStatus,
    to: ProjectStatus,
) -> Result<(), CoreError> {
    if session.can(Capability::OverrideStatus) {
        return Ok(());
    }
    check_transition(from, to)
}

fn validate_money(
    budget: Option<Money>,
    amounts: [(&str, Option<Money>); 3],
) -> Result<(), CoreError> {
    if let Some(budget) = budget {
        validate_budget(budget)?;
    }
    for (field, amount) in amounts {
        if let Some(amount) = amount {
            validate_amount(field, amount)?;
        }
    }
    Ok(())
}

fn validate_scores(
    progress: Option<i32>,
    quality_score: Option<i16>,
    client_satisfaction: Option<i16>,
) -> Result<(), CoreError> {
    if let Some(progress) = progress {
        validate_progress(progress)?;
    }
    if let Some(score) = quality_score {
        validate_quality_score(score)?;
    }
    if let Some(score) = client_satisfaction {
        validate_client_satisfaction(score)?;
    }
    Ok(())
}

fn validate_create(input: &CreateProject) -> Result<(), CoreError> {
    validate_name(&input.name)?;
    check_project_dates(input.start_date, input.estimated_end_date)?;
    validate_money(
        input.budget,
        [
            ("Actual cost", input.actual_cost),
            ("Estimated revenue", input.estimated_revenue),
            ("Actual revenue", input.actual_revenue),
        ],
    )?;
    validate_scores(input.progress, input.quality_score, input.client_satisfaction)
}

fn validate_update(input: &UpdateProject) -> Result<(), CoreError> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    validate_money(
        input.budget,
        [
            ("Actual cost", input.actual_cost),
            ("Estimated revenue", input.estimated_revenue),
            ("Actual revenue", input.actual_revenue),
        ],
    )?;
    validate_scores(input.progress, input.quality_score, input.client_satisfaction)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use buildcrm_core::status::Role;
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn create_rejects_equal_dates() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let input = CreateProject {
            name: "Depot".into(),
            start_date: Some(day),
            estimated_end_date: Some(day),
            ..Default::default()
        };
        assert_matches!(validate_create(&input), Err(CoreError::Validation(_)));
    }

    #[test]
    fn create_rejects_bad_numbers() {
        let zero_budget = CreateProject {
            name: "Depot".into(),
            budget: Some(Money::ZERO),
            ..Default::default()
        };
        assert!(validate_create(&zero_budget).is_err());

        let negative_cost = CreateProject {
            name: "Depot".into(),
            actual_cost: Some(Money::from(-1)),
            ..Default::default()
        };
        assert!(validate_create(&negative_cost).is_err());

        let bad_progress = CreateProject {
            name: "Depot".into(),
            progress: Some(101),
            ..Default::default()
        };
        assert!(validate_create(&bad_progress).is_err());
    }

    #[test]
    fn update_allows_empty_patch() {
        assert!(validate_update(&UpdateProject::default()).is_ok());
        let blank_name = UpdateProject {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(validate_update(&blank_name).is_err());
    }

    #[test]
    fn admin_may_skip_lifecycle() {
        let admin = Session::new(1, Role::Admin);
        let manager = Session::new(2, Role::Manager);
        let (from, to) = (ProjectStatus::Planning, ProjectStatus::Completed);

        assert!(authorize_transition(&admin, from, to).is_ok());
        assert_matches!(
            authorize_transition(&manager, from, to),
            Err(CoreError::Validation(_))
        );
        assert!(authorize_transition(&manager, from, ProjectStatus::Approved).is_ok());
    }
}
