//! Integration tests for aggregate statistics.
//!
//! Both aggregation paths are run against the same data and must agree
//! exactly, including after the SQL functions have been dropped.

use assert_matches::assert_matches;
use buildcrm_core::stats::{AggregationMode, StatsOutcome};
use buildcrm_core::status::{ClientStatus, ProjectStatus};
use buildcrm_core::types::Money;
use buildcrm_db::models::client::CreateClient;
use buildcrm_db::models::project::CreateProject;
use buildcrm_db::repositories::{ClientRepo, ProjectRepo, StatsRepo};
use chrono::{Duration, Utc};
use sqlx::PgPool;

async fn seed_projects(pool: &PgPool) {
    for (name, status, progress, budget) in [
        ("A", ProjectStatus::InProgress, 50, 100_000),
        ("B", ProjectStatus::Completed, 100, 200_000),
        ("C", ProjectStatus::OnHold, 30, 150_000),
    ] {
        let input = CreateProject {
            name: name.to_string(),
            status: Some(status),
            progress: Some(progress),
            budget: Some(Money::from(budget)),
            actual_cost: Some(Money::new(12_345, 2)),
            ..Default::default()
        };
        ProjectRepo::create(pool, &input).await.unwrap();
    }
}

async fn seed_clients(pool: &PgPool) {
    let past = (Utc::now() - Duration::days(3)).date_naive();
    for (name, status, value, follow_up) in [
        ("Lead Co", ClientStatus::Lead, 10_000, Some(past)),
        ("Active Co", ClientStatus::Active, 50_000, None),
        ("Opp Co", ClientStatus::Opportunity, 25_000, Some(past)),
        ("Lost Co", ClientStatus::Lost, 5_000, Some(past)),
    ] {
        let input = CreateClient {
            company_name: name.to_string(),
            status: Some(status),
            estimated_value: Some(Money::from(value)),
            next_follow_up_date: follow_up,
            ..Default::default()
        };
        ClientRepo::create(pool, &input).await.unwrap();
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_database_yields_zeroes(pool: PgPool) {
    let outcome = StatsRepo::project_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap();
    let stats = outcome.stats();
    assert_eq!(stats.total_projects, 0);
    assert_eq!(stats.average_progress, 0.0);
    assert_eq!(stats.total_budget, Money::ZERO);

    let clients = StatsRepo::client_stats(&pool, AggregationMode::FallbackOnly)
        .await
        .unwrap()
        .into_stats();
    assert_eq!(clients.conversion_rate, 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_three_project_scenario(pool: PgPool) {
    seed_projects(&pool).await;
    let outcome = StatsRepo::project_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap();
    assert_matches!(outcome, StatsOutcome::Aggregated(_));
    let stats = outcome.into_stats();
    assert_eq!(stats.total_projects, 3);
    assert_eq!(stats.active_projects, 1);
    assert_eq!(stats.completed_projects, 1);
    assert_eq!(stats.on_hold_projects, 1);
    assert_eq!(stats.average_progress, 60.0);
    assert_eq!(stats.total_budget, Money::from(450_000));
    assert_eq!(stats.total_actual_cost, Money::new(37_035, 2));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_project_paths_agree(pool: PgPool) {
    seed_projects(&pool).await;
    let rpc = StatsRepo::project_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap();
    let fallback = StatsRepo::project_stats(&pool, AggregationMode::FallbackOnly)
        .await
        .unwrap();
    assert!(!rpc.is_fallback());
    assert_matches!(&fallback, StatsOutcome::FallbackComputed { reason: None, .. });
    assert_eq!(rpc.stats(), fallback.stats());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_function_falls_back(pool: PgPool) {
    seed_projects(&pool).await;
    let before = StatsRepo::project_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap()
        .into_stats();

    sqlx::query("DROP FUNCTION project_stats()")
        .execute(&pool)
        .await
        .unwrap();

    let after = StatsRepo::project_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap();
    assert_matches!(&after, StatsOutcome::FallbackComputed { reason: Some(_), .. });
    assert_eq!(after.stats(), &before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_paths_agree(pool: PgPool) {
    seed_clients(&pool).await;
    let rpc = StatsRepo::client_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap();
    assert!(!rpc.is_fallback());

    sqlx::query("DROP FUNCTION client_stats()")
        .execute(&pool)
        .await
        .unwrap();
    let fallback = StatsRepo::client_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap();
    assert!(fallback.is_fallback());
    assert_eq!(rpc.stats(), fallback.stats());

    let stats = fallback.into_stats();
    assert_eq!(stats.total_clients, 4);
    assert_eq!(stats.active_clients, 1);
    assert_eq!(stats.leads, 1);
    assert_eq!(stats.opportunities, 1);
    assert_eq!(stats.conversion_rate, 25.0);
    assert_eq!(stats.total_estimated_value, Money::from(90_000));
    assert_eq!(stats.pipeline_value, Money::from(85_000));
    assert_eq!(stats.overdue_follow_ups, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fallback_failure_is_an_error(pool: PgPool) {
    seed_projects(&pool).await;
    sqlx::query("DROP FUNCTION project_stats()")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("ALTER TABLE projects RENAME COLUMN actual_revenue TO revenue_archived")
        .execute(&pool)
        .await
        .unwrap();

    let err = StatsRepo::project_stats(&pool, AggregationMode::PreferRpc)
        .await
        .unwrap_err();
    assert_matches!(err, buildcrm_db::StatsError::Query { query: "project_figures", .. });
}
