//! Handlers for aggregate project and client statistics.

use axum::extract::State;
use axum::Json;
use buildcrm_core::stats::{completion_rate, ClientStats, ProjectStats};
use buildcrm_db::repositories::StatsRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireViewFinancials;
use crate::response::DataResponse;
use crate::state::AppState;

/// Project stats plus the derived completion rate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatsResponse {
    #[serde(flatten)]
    pub stats: ProjectStats,
    pub completion_rate: f64,
}

impl From<ProjectStats> for ProjectStatsResponse {
    fn from(stats: ProjectStats) -> Self {
        Self {
            completion_rate: completion_rate(&stats),
            stats,
        }
    }
}

/// GET /api/v1/projects/stats (also /api/v1/project-stats)
pub async fn project_stats(
    State(state): State<AppState>,
    RequireViewFinancials(_session): RequireViewFinancials,
) -> AppResult<Json<DataResponse<ProjectStatsResponse>>> {
    let outcome = StatsRepo::project_stats(&state.pool, state.config.stats_mode).await?;
    tracing::debug!(source = outcome.source(), "Project stats computed");
    Ok(Json(DataResponse {
        data: outcome.into_stats().into(),
    }))
}

/// GET /api/v1/clients/stats (also /api/v1/client-stats)
pub async fn client_stats(
    State(state): State<AppState>,
    RequireViewFinancials(_session): RequireViewFinancials,
) -> AppResult<Json<DataResponse<ClientStats>>> {
    let outcome = StatsRepo::client_stats(&state.pool, state.config.stats_mode).await?;
    tracing::debug!(source = outcome.source(), "Client stats computed");
    Ok(Json(DataResponse {
        data: outcome.into_stats(),
    }))
}
