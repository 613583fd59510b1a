//! Handler for the dashboard summary.
//!
//! One request gathers stats, the newest projects, and the overdue list.
//! Callers with the `ViewFinancials` capability get company-wide stats,
//! formatted money figures, and itemized amounts on each listed project.
//! Everyone else gets counts and progress over the projects they work on,
//! with the money totals zeroed.

use axum::extract::State;
use axum::Json;
use buildcrm_core::display::{format_currency, format_currency_compact, CurrencyFormat};
use buildcrm_core::roles::Capability;
use buildcrm_core::stats::{compute_project_stats, ClientStats, ProjectStats};
use buildcrm_core::types::{Money, Timestamp};
use buildcrm_db::models::project::{Project, ProjectView};
use buildcrm_db::repositories::{ProjectRepo, StatsRepo};
use chrono::Utc;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::stats::ProjectStatsResponse;
use crate::middleware::auth::Session;
use crate::response::DataResponse;
use crate::state::AppState;

/// Rows shown in each dashboard list.
const DASHBOARD_LIST_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub project_stats: ProjectStatsResponse,
    /// `None` for callers without financial access.
    pub client_stats: Option<ClientStats>,
    /// Display strings for the money totals, `None` without financial access.
    pub figures: Option<DashboardFigures>,
    pub recent_projects: Vec<DashboardProject>,
    pub overdue_projects: Vec<DashboardProject>,
}

/// A listed project, with two-decimal money strings for callers with
/// financial access.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardProject {
    #[serde(flatten)]
    pub project: ProjectView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost_display: Option<String>,
}

impl DashboardProject {
    fn new(project: Project, now: Timestamp, format: Option<&CurrencyFormat>) -> Self {
        let itemize = |amount: Option<Money>| {
            format.and_then(|format| amount.map(|amount| format_currency(amount, format)))
        };
        Self {
            budget_display: itemize(project.budget),
            actual_cost_display: itemize(project.actual_cost),
            project: ProjectView::at(project, now),
        }
    }
}

/// Money totals formatted for display without fractional digits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFigures {
    pub total_budget: String,
    pub total_actual_cost: String,
    pub total_revenue: String,
    pub pipeline_value: String,
}

impl DashboardFigures {
    fn new(projects: &ProjectStats, clients: &ClientStats, format: &CurrencyFormat) -> Self {
        Self {
            total_budget: format_currency_compact(projects.total_budget, format),
            total_actual_cost: format_currency_compact(projects.total_actual_cost, format),
            total_revenue: format_currency_compact(projects.total_revenue, format),
            pipeline_value: format_currency_compact(clients.pipeline_value, format),
        }
    }
}

/// GET /api/v1/dashboard
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<DashboardResponse>>> {
    let pool = &state.pool;
    let scope = session.project_scope();

    let (recent, overdue) = tokio::try_join!(
        ProjectRepo::list_recent(pool, scope, DASHBOARD_LIST_LIMIT),
        ProjectRepo::list_overdue(pool, scope, DASHBOARD_LIST_LIMIT),
    )?;

    let financial = session.can(Capability::ViewFinancials);
    let (project_stats, client_stats, figures) = if financial {
        let (projects, clients) = tokio::try_join!(
            StatsRepo::project_stats(pool, state.config.stats_mode),
            StatsRepo::client_stats(pool, state.config.stats_mode),
        )?;
        let (projects, clients) = (projects.into_stats(), clients.into_stats());
        let figures = DashboardFigures::new(&projects, &clients, &state.config.currency);
        (projects, Some(clients), Some(figures))
    } else {
        let snapshots = ProjectRepo::snapshots(pool, scope).await?;
        let stats = ProjectStats {
            total_budget: Money::ZERO,
            total_actual_cost: Money::ZERO,
            total_revenue: Money::ZERO,
            ..compute_project_stats(&snapshots)
        };
        (stats, None, None)
    };

    let now = Utc::now();
    let format = financial.then_some(&state.config.currency);
    Ok(Json(DataResponse {
        data: DashboardResponse {
            project_stats: project_stats.into(),
            client_stats,
            figures,
            recent_projects: recent
                .into_iter()
                .map(|p| DashboardProject::new(p, now, format))
                .collect(),
            overdue_projects: overdue
                .into_iter()
                .map(|p| DashboardProject::new(p, now, format))
                .collect(),
        },
    }))
}
