//! Aggregate statistics over projects and clients.
//!
//! Stats come from the `project_stats()` / `client_stats()` SQL functions
//! when they are available. When the call fails (function missing, no
//! execute permission, ...) the same parts are gathered with independent
//! queries run concurrently. Both paths feed the core `assemble_*`
//! functions, so the numbers match exactly.

use buildcrm_core::stats::{
    assemble_client_stats, assemble_project_stats, AggregationMode, ClientFigures, ClientStats,
    ClientStatusCounts, ProjectFigures, ProjectStats, ProjectStatusCounts, StatsOutcome,
};
use buildcrm_core::status::{ClientStatus, ProjectStatus};
use buildcrm_core::types::Money;
use sqlx::{FromRow, PgPool};

/// A fallback stats query failed. The aggregate is not produced from
/// partial results.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("stats query '{query}' failed: {source}")]
    Query {
        query: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Row returned by `project_stats()`.
#[derive(Debug, FromRow)]
struct ProjectStatsRow {
    total_projects: i64,
    active_projects: i64,
    completed_projects: i64,
    on_hold_projects: i64,
    progress_sum: i64,
    total_budget: Money,
    total_actual_cost: Money,
    total_revenue: Money,
}

/// Row returned by `client_stats()`.
#[derive(Debug, FromRow)]
struct ClientStatsRow {
    total_clients: i64,
    active_clients: i64,
    leads: i64,
    opportunities: i64,
    total_estimated_value: Money,
    pipeline_value: Money,
    overdue_follow_ups: i64,
}

pub struct StatsRepo;

impl StatsRepo {
    /// Project stats via the aggregation function, or the fallback queries.
    pub async fn project_stats(
        pool: &PgPool,
        mode: AggregationMode,
    ) -> Result<StatsOutcome<ProjectStats>, StatsError> {
        let reason = match mode {
            AggregationMode::FallbackOnly => None,
            AggregationMode::PreferRpc => match Self::project_stats_rpc(pool).await {
                Ok(stats) => return Ok(StatsOutcome::Aggregated(stats)),
                Err(e) => {
                    tracing::warn!(error = %e, "project_stats() unavailable, using fallback queries");
                    Some(e.to_string())
                }
            },
        };

        let stats = Self::project_stats_fallback(pool).await?;
        Ok(StatsOutcome::FallbackComputed { stats, reason })
    }

    /// Client stats via the aggregation function, or the fallback queries.
    pub async fn client_stats(
        pool: &PgPool,
        mode: AggregationMode,
    ) -> Result<StatsOutcome<ClientStats>, StatsError> {
        let reason = match mode {
            AggregationMode::FallbackOnly => None,
            AggregationMode::PreferRpc => match Self::client_stats_rpc(pool).await {
                Ok(stats) => return Ok(StatsOutcome::Aggregated(stats)),
                Err(e) => {
                    tracing::warn!(error = %e, "client_stats() unavailable, using fallback queries");
                    Some(e.to_string())
                }
            },
        };

        let stats = Self::client_stats_fallback(pool).await?;
        Ok(StatsOutcome::FallbackComputed { stats, reason })
    }

    async fn project_stats_rpc(pool: &PgPool) -> Result<ProjectStats, sqlx::Error> {
        let row = sqlx::query_as::<_, ProjectStatsRow>("SELECT * FROM project_stats()")
            .fetch_one(pool)
            .await?;
        Ok(assemble_project_stats(
            ProjectStatusCounts {
                total: row.total_projects,
                in_progress: row.active_projects,
                completed: row.completed_projects,
                on_hold: row.on_hold_projects,
            },
            ProjectFigures {
                progress_sum: row.progress_sum,
                total_budget: row.total_budget,
                total_actual_cost: row.total_actual_cost,
                total_revenue: row.total_revenue,
            },
        ))
    }

    async fn client_stats_rpc(pool: &PgPool) -> Result<ClientStats, sqlx::Error> {
        let row = sqlx::query_as::<_, ClientStatsRow>("SELECT * FROM client_stats()")
            .fetch_one(pool)
            .await?;
        Ok(assemble_client_stats(
            ClientStatusCounts {
                total: row.total_clients,
                active: row.active_clients,
                leads: row.leads,
                opportunities: row.opportunities,
            },
            ClientFigures {
                total_estimated_value: row.total_estimated_value,
                pipeline_value: row.pipeline_value,
                overdue_follow_ups: row.overdue_follow_ups,
            },
        ))
    }

    async fn project_stats_fallback(pool: &PgPool) -> Result<ProjectStats, StatsError> {
        let (total, in_progress, completed, on_hold, figures) = tokio::join!(
            count_projects(pool, None),
            count_projects(pool, Some(ProjectStatus::InProgress)),
            count_projects(pool, Some(ProjectStatus::Completed)),
            count_projects(pool, Some(ProjectStatus::OnHold)),
            project_figures(pool),
        );

        // Check every part before combining so each failure is logged.
        let total = checked("project_total", total);
        let in_progress = checked("project_in_progress", in_progress);
        let completed = checked("project_completed", completed);
        let on_hold = checked("project_on_hold", on_hold);
        let figures = checked("project_figures", figures);

        let counts = ProjectStatusCounts {
            total: total?,
            in_progress: in_progress?,
            completed: completed?,
            on_hold: on_hold?,
        };
        Ok(assemble_project_stats(counts, figures?))
    }

    async fn client_stats_fallback(pool: &PgPool) -> Result<ClientStats, StatsError> {
        let (total, active, leads, opportunities, figures) = tokio::join!(
            count_clients(pool, None),
            count_clients(pool, Some(ClientStatus::Active)),
            count_clients(pool, Some(ClientStatus::Lead)),
            count_clients(pool, Some(ClientStatus::Opportunity)),
            client_figures(pool),
        );

        let total = checked("client_total", total);
        let active = checked("client_active", active);
        let leads = checked("client_leads", leads);
        let opportunities = checked("client_opportunities", opportunities);
        let figures = checked("client_figures", figures);

        let counts = ClientStatusCounts {
            total: total?,
            active: active?,
            leads: leads?,
            opportunities: opportunities?,
        };
        Ok(assemble_client_stats(counts, figures?))
    }
}

fn checked<T>(query: &'static str, result: Result<T, sqlx::Error>) -> Result<T, StatsError> {
    result.map_err(|source| {
        tracing::warn!(query, error = %source, "Fallback stats query failed");
        StatsError::Query { query, source }
    })
}

async fn count_projects(pool: &PgPool, status: Option<ProjectStatus>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE ($1::TEXT IS NULL OR status = $1)")
        .bind(status.map(ProjectStatus::as_str))
        .fetch_one(pool)
        .await
}

async fn project_figures(pool: &PgPool) -> Result<ProjectFigures, sqlx::Error> {
    let (progress_sum, total_budget, total_actual_cost, total_revenue): (i64, Money, Money, Money) =
        sqlx::query_as(
            "SELECT COALESCE(SUM(progress), 0)::BIGINT,
                    COALESCE(SUM(budget), 0),
                    COALESCE(SUM(actual_cost), 0),
                    COALESCE(SUM(actual_revenue), 0)
             FROM projects",
        )
        .fetch_one(pool)
        .await?;
    Ok(ProjectFigures {
        progress_sum,
        total_budget,
        total_actual_cost,
        total_revenue,
    })
}

async fn count_clients(pool: &PgPool, status: Option<ClientStatus>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE ($1::TEXT IS NULL OR status = $1)")
        .bind(status.map(ClientStatus::as_str))
        .fetch_one(pool)
        .await
}

async fn client_figures(pool: &PgPool) -> Result<ClientFigures, sqlx::Error> {
    let (total_estimated_value, pipeline_value, overdue_follow_ups): (Money, Money, i64) =
        sqlx::query_as(
            "SELECT COALESCE(SUM(estimated_value), 0),
                    COALESCE(SUM(estimated_value) FILTER (WHERE status NOT IN ('inactive', 'lost')), 0),
                    COUNT(*) FILTER (
                        WHERE next_follow_up_date IS NOT NULL
                          AND next_follow_up_date::TIMESTAMP AT TIME ZONE 'UTC' < NOW()
                          AND status NOT IN ('inactive', 'lost')
                    )
             FROM clients",
        )
        .fetch_one(pool)
        .await?;
    Ok(ClientFigures {
        total_estimated_value,
        pipeline_value,
        overdue_follow_ups,
    })
}
