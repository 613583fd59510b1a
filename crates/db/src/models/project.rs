//! Project entity model, DTOs, list filters and the camelCase view.

use buildcrm_core::display::{days_remaining, is_overdue, project_health, Health};
use buildcrm_core::pagination::SortOrder;
use buildcrm_core::status::{ProjectPriority, ProjectStatus, RiskLevel};
use buildcrm_core::types::{Date, DbId, Money, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::columns::NullableText;

/// A project row from the `projects` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Project {
    pub id: DbId,
    pub project_number: String,
    pub name: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub tags: Vec<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    #[sqlx(try_from = "String")]
    pub priority: ProjectPriority,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub budget: Option<Money>,
    pub actual_cost: Option<Money>,
    pub estimated_revenue: Option<Money>,
    pub actual_revenue: Option<Money>,
    pub progress: i32,
    pub client_id: Option<DbId>,
    pub project_manager_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub team_member_ids: Vec<DbId>,
    #[sqlx(try_from = "NullableText")]
    pub risk_level: Option<RiskLevel>,
    pub quality_score: Option<i16>,
    pub client_satisfaction: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Whether `user_id` manages this project or is on its team.
    pub fn involves(&self, user_id: DbId) -> bool {
        self.project_manager_id == Some(user_id) || self.team_member_ids.contains(&user_id)
    }
}

/// Persisted column name paired with its wire name, for every field of
/// [`Project`].
pub const PROJECT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("project_number", "projectNumber"),
    ("name", "name"),
    ("description", "description"),
    ("project_type", "projectType"),
    ("tags", "tags"),
    ("status", "status"),
    ("priority", "priority"),
    ("start_date", "startDate"),
    ("estimated_end_date", "estimatedEndDate"),
    ("actual_end_date", "actualEndDate"),
    ("budget", "budget"),
    ("actual_cost", "actualCost"),
    ("estimated_revenue", "estimatedRevenue"),
    ("actual_revenue", "actualRevenue"),
    ("progress", "progress"),
    ("client_id", "clientId"),
    ("project_manager_id", "projectManagerId"),
    ("contractor_id", "contractorId"),
    ("team_member_ids", "teamMemberIds"),
    ("risk_level", "riskLevel"),
    ("quality_score", "qualityScore"),
    ("client_satisfaction", "clientSatisfaction"),
    ("created_at", "createdAt"),
    ("updated_at", "updatedAt"),
];

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a new project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    /// Generated as `PRJ-00001` style when omitted.
    pub project_number: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Defaults to `planning`.
    pub status: Option<ProjectStatus>,
    /// Defaults to `medium`.
    pub priority: Option<ProjectPriority>,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub budget: Option<Money>,
    pub actual_cost: Option<Money>,
    pub estimated_revenue: Option<Money>,
    pub actual_revenue: Option<Money>,
    pub progress: Option<i32>,
    pub client_id: Option<DbId>,
    pub project_manager_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub team_member_ids: Option<Vec<DbId>>,
    pub risk_level: Option<RiskLevel>,
    pub quality_score: Option<i16>,
    pub client_satisfaction: Option<i16>,
}

/// DTO for updating an existing project. All fields are optional; absent
/// fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub budget: Option<Money>,
    pub actual_cost: Option<Money>,
    pub estimated_revenue: Option<Money>,
    pub actual_revenue: Option<Money>,
    pub progress: Option<i32>,
    pub client_id: Option<DbId>,
    pub project_manager_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub team_member_ids: Option<Vec<DbId>>,
    pub risk_level: Option<RiskLevel>,
    pub quality_score: Option<i16>,
    pub client_satisfaction: Option<i16>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Optional predicates for project listing. Every present field narrows the
/// result; absent fields add nothing.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilters {
    pub status: Option<ProjectStatus>,
    pub project_type: Option<String>,
    pub priority: Option<ProjectPriority>,
    pub client_id: Option<DbId>,
    pub project_manager_id: Option<DbId>,
    /// Case-insensitive substring over name, description and project number.
    pub search: Option<String>,
    /// Inclusive lower bound on `start_date`.
    pub start_date: Option<Date>,
    /// Inclusive upper bound on `estimated_end_date`.
    pub end_date: Option<Date>,
    /// Restrict to projects this user manages or is a team member of.
    pub visible_to: Option<DbId>,
}

/// Columns a project list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectSortKey {
    #[default]
    #[serde(alias = "created_at")]
    CreatedAt,
    #[serde(alias = "updated_at")]
    UpdatedAt,
    Name,
    #[serde(alias = "project_number")]
    ProjectNumber,
    Status,
    Priority,
    #[serde(alias = "start_date")]
    StartDate,
    #[serde(alias = "estimated_end_date")]
    EstimatedEndDate,
    Budget,
    Progress,
}

impl ProjectSortKey {
    pub fn column(self) -> &'static str {
        match self {
            ProjectSortKey::CreatedAt => "created_at",
            ProjectSortKey::UpdatedAt => "updated_at",
            ProjectSortKey::Name => "name",
            ProjectSortKey::ProjectNumber => "project_number",
            ProjectSortKey::Status => "status",
            ProjectSortKey::Priority => "priority",
            ProjectSortKey::StartDate => "start_date",
            ProjectSortKey::EstimatedEndDate => "estimated_end_date",
            ProjectSortKey::Budget => "budget",
            ProjectSortKey::Progress => "progress",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectSort {
    pub key: ProjectSortKey,
    pub order: SortOrder,
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// Wire shape of a project: camelCase fields plus derived display fields
/// that are recomputed on every read and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: DbId,
    pub project_number: String,
    pub name: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub tags: Vec<String>,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    pub start_date: Option<Date>,
    pub estimated_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub budget: Option<Money>,
    pub actual_cost: Option<Money>,
    pub estimated_revenue: Option<Money>,
    pub actual_revenue: Option<Money>,
    pub progress: i32,
    pub client_id: Option<DbId>,
    pub project_manager_id: Option<DbId>,
    pub contractor_id: Option<DbId>,
    pub team_member_ids: Vec<DbId>,
    pub risk_level: Option<RiskLevel>,
    pub quality_score: Option<i16>,
    pub client_satisfaction: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub days_remaining: Option<i64>,
    #[serde(default)]
    pub expected_progress: Option<f64>,
    #[serde(default)]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub health: Option<Health>,
}

impl ProjectView {
    /// Build the view with derived fields evaluated at `now`.
    pub fn at(project: Project, now: Timestamp) -> Self {
        let overdue = is_overdue(project.estimated_end_date, project.status, now);
        let remaining = project.estimated_end_date.map(|end| days_remaining(end, now));
        let health = project_health(
            project.progress,
            project.start_date,
            project.estimated_end_date,
            now,
        );

        Self {
            id: project.id,
            project_number: project.project_number,
            name: project.name,
            description: project.description,
            project_type: project.project_type,
            tags: project.tags,
            status: project.status,
            priority: project.priority,
            start_date: project.start_date,
            estimated_end_date: project.estimated_end_date,
            actual_end_date: project.actual_end_date,
            budget: project.budget,
            actual_cost: project.actual_cost,
            estimated_revenue: project.estimated_revenue,
            actual_revenue: project.actual_revenue,
            progress: project.progress,
            client_id: project.client_id,
            project_manager_id: project.project_manager_id,
            contractor_id: project.contractor_id,
            team_member_ids: project.team_member_ids,
            risk_level: project.risk_level,
            quality_score: project.quality_score,
            client_satisfaction: project.client_satisfaction,
            created_at: project.created_at,
            updated_at: project.updated_at,
            is_overdue: overdue,
            days_remaining: remaining,
            expected_progress: health.map(|h| h.expected_progress),
            health_score: health.map(|h| h.health_score),
            health: health.map(|h| h.health),
        }
    }
}

impl From<Project> for ProjectView {
    fn from(project: Project) -> Self {
        Self::at(project, Utc::now())
    }
}

/// Drops the derived fields.
impl From<ProjectView> for Project {
    fn from(view: ProjectView) -> Self {
        Self {
            id: view.id,
            project_number: view.project_number,
            name: view.name,
            description: view.description,
            project_type: view.project_type,
            tags: view.tags,
            status: view.status,
            priority: view.priority,
            start_date: view.start_date,
            estimated_end_date: view.estimated_end_date,
            actual_end_date: view.actual_end_date,
            budget: view.budget,
            actual_cost: view.actual_cost,
            estimated_revenue: view.estimated_revenue,
            actual_revenue: view.actual_revenue,
            progress: view.progress,
            client_id: view.client_id,
            project_manager_id: view.project_manager_id,
            contractor_id: view.contractor_id,
            team_member_ids: view.team_member_ids,
            risk_level: view.risk_level,
            quality_score: view.quality_score,
            client_satisfaction: view.client_satisfaction,
            created_at: view.created_at,
            updated_at: view.updated_at,
        }
    }
}
