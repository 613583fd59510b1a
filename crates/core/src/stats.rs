//! Project and client statistics.
//!
//! Statistics can be produced two ways: a single server-side aggregation
//! call, or several independent count/sum queries issued by the service.
//! Both paths hand their raw parts to the same `assemble_*` functions here,
//! so the resulting numbers are identical regardless of the path taken.

use serde::{Deserialize, Serialize};

use crate::display::date_start_utc;
use crate::status::{ClientStatus, ProjectStatus};
use crate::types::{Date, Money, Timestamp};

// ---------------------------------------------------------------------------
// Aggregation strategy
// ---------------------------------------------------------------------------

/// Which aggregation path the stats service should attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationMode {
    /// Try the server-side aggregation function, fall back on error.
    #[default]
    PreferRpc,
    /// Skip the aggregation function entirely.
    FallbackOnly,
}

/// Tagged result of a stats computation, recording which path produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsOutcome<T> {
    /// Produced by the single aggregation call.
    Aggregated(T),
    /// Produced by the per-predicate fallback queries. `reason` is `None`
    /// when the fallback was requested up front rather than triggered by an
    /// aggregation failure.
    FallbackComputed { stats: T, reason: Option<String> },
}

impl<T> StatsOutcome<T> {
    pub fn stats(&self) -> &T {
        match self {
            StatsOutcome::Aggregated(stats) => stats,
            StatsOutcome::FallbackComputed { stats, .. } => stats,
        }
    }

    pub fn into_stats(self) -> T {
        match self {
            StatsOutcome::Aggregated(stats) => stats,
            StatsOutcome::FallbackComputed { stats, .. } => stats,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, StatsOutcome::FallbackComputed { .. })
    }

    /// Short label for logs.
    pub fn source(&self) -> &'static str {
        match self {
            StatsOutcome::Aggregated(_) => "rpc",
            StatsOutcome::FallbackComputed { .. } => "fallback",
        }
    }
}

// ---------------------------------------------------------------------------
// Project stats
// ---------------------------------------------------------------------------

/// Aggregate project statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_projects: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
    pub on_hold_projects: i64,
    pub average_progress: f64,
    pub total_budget: Money,
    pub total_actual_cost: Money,
    pub total_revenue: Money,
}

/// The fields of a project that feed [`ProjectStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub status: ProjectStatus,
    pub progress: i32,
    pub budget: Option<Money>,
    pub actual_cost: Option<Money>,
    pub actual_revenue: Option<Money>,
}

/// Row counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectStatusCounts {
    pub total: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub on_hold: i64,
}

/// Summed numeric columns across all projects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFigures {
    pub progress_sum: i64,
    pub total_budget: Money,
    pub total_actual_cost: Money,
    pub total_revenue: Money,
}

/// Combine counts and figures into the final stats object.
pub fn assemble_project_stats(counts: ProjectStatusCounts, figures: ProjectFigures) -> ProjectStats {
    ProjectStats {
        total_projects: counts.total,
        active_projects: counts.in_progress,
        completed_projects: counts.completed,
        on_hold_projects: counts.on_hold,
        average_progress: ratio(figures.progress_sum, counts.total, 1.0),
        total_budget: figures.total_budget,
        total_actual_cost: figures.total_actual_cost,
        total_revenue: figures.total_revenue,
    }
}

/// Compute project stats from in-memory rows.
pub fn compute_project_stats(rows: &[ProjectSnapshot]) -> ProjectStats {
    let mut counts = ProjectStatusCounts {
        total: rows.len() as i64,
        ..Default::default()
    };
    let mut figures = ProjectFigures::default();

    for row in rows {
        match row.status {
            ProjectStatus::InProgress => counts.in_progress += 1,
            ProjectStatus::Completed => counts.completed += 1,
            ProjectStatus::OnHold => counts.on_hold += 1,
            _ => {}
        }
        figures.progress_sum += i64::from(row.progress);
        figures.total_budget += row.budget.unwrap_or_default();
        figures.total_actual_cost += row.actual_cost.unwrap_or_default();
        figures.total_revenue += row.actual_revenue.unwrap_or_default();
    }

    assemble_project_stats(counts, figures)
}

/// Completed projects as a percentage of all projects (0 when empty).
pub fn completion_rate(stats: &ProjectStats) -> f64 {
    ratio(stats.completed_projects, stats.total_projects, 100.0)
}

// ---------------------------------------------------------------------------
// Client stats
// ---------------------------------------------------------------------------

/// Aggregate client statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub total_clients: i64,
    pub active_clients: i64,
    pub leads: i64,
    pub opportunities: i64,
    pub conversion_rate: f64,
    pub total_estimated_value: Money,
    /// Estimated value of clients that are not inactive or lost.
    pub pipeline_value: Money,
    pub overdue_follow_ups: i64,
}

/// The fields of a client that feed [`ClientStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSnapshot {
    pub status: ClientStatus,
    pub estimated_value: Option<Money>,
    pub next_follow_up_date: Option<Date>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStatusCounts {
    pub total: i64,
    pub active: i64,
    pub leads: i64,
    pub opportunities: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientFigures {
    pub total_estimated_value: Money,
    pub pipeline_value: Money,
    pub overdue_follow_ups: i64,
}

pub fn assemble_client_stats(counts: ClientStatusCounts, figures: ClientFigures) -> ClientStats {
    ClientStats {
        total_clients: counts.total,
        active_clients: counts.active,
        leads: counts.leads,
        opportunities: counts.opportunities,
        conversion_rate: ratio(counts.active, counts.total, 100.0),
        total_estimated_value: figures.total_estimated_value,
        pipeline_value: figures.pipeline_value,
        overdue_follow_ups: figures.overdue_follow_ups,
    }
}

/// Compute client stats from in-memory rows. A follow-up is overdue once
/// the start of its date has passed and the client is still open.
pub fn compute_client_stats(rows: &[ClientSnapshot], now: Timestamp) -> ClientStats {
    let mut counts = ClientStatusCounts {
        total: rows.len() as i64,
        ..Default::default()
    };
    let mut figures = ClientFigures::default();

    for row in rows {
        match row.status {
            ClientStatus::Active => counts.active += 1,
            ClientStatus::Lead => counts.leads += 1,
            ClientStatus::Opportunity => counts.opportunities += 1,
            _ => {}
        }
        let value = row.estimated_value.unwrap_or_default();
        figures.total_estimated_value += value;
        if !row.status.is_closed() {
            figures.pipeline_value += value;
            if row
                .next_follow_up_date
                .is_some_and(|date| date_start_utc(date) < now)
            {
                figures.overdue_follow_ups += 1;
            }
        }
    }

    assemble_client_stats(counts, figures)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `numerator / denominator * scale`, rounded to two decimals; 0 when the
/// denominator is not positive.
fn ratio(numerator: i64, denominator: i64, scale: f64) -> f64 {
    if denominator <= 0 {
        return 0.0;
    }
    round2(numerator as f64 / denominator as f64 * scale)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
