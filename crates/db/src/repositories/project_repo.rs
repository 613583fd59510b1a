//! Repository for the `projects` table.

use buildcrm_core::pagination::PageRequest;
use buildcrm_core::stats::ProjectSnapshot;
use buildcrm_core::status::{ProjectPriority, ProjectStatus, RiskLevel};
use buildcrm_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::project::{CreateProject, Project, ProjectFilters, ProjectSort, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_number, name, description, project_type, tags, status, \
                       priority, start_date, estimated_end_date, actual_end_date, budget, \
                       actual_cost, estimated_revenue, actual_revenue, progress, client_id, \
                       project_manager_id, contractor_id, team_member_ids, risk_level, \
                       quality_score, client_satisfaction, created_at, updated_at";

/// Predicate for a project whose estimated end has passed without completion.
const OVERDUE_PREDICATE: &str = "estimated_end_date IS NOT NULL \
                                 AND estimated_end_date::TIMESTAMP AT TIME ZONE 'UTC' < NOW() \
                                 AND status <> 'completed'";

/// Provides CRUD, listing and dashboard queries for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// Omitted status, priority and progress take their column defaults; an
    /// omitted project number is drawn from `project_number_seq`.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (
                project_number, name, description, project_type, tags, status, priority,
                start_date, estimated_end_date, actual_end_date, budget, actual_cost,
                estimated_revenue, actual_revenue, progress, client_id, project_manager_id,
                contractor_id, team_member_ids, risk_level, quality_score, client_satisfaction
             ) VALUES (
                COALESCE($1, 'PRJ-' || lpad(nextval('project_number_seq')::TEXT, 5, '0')),
                $2, $3, $4, COALESCE($5, '{{}}'), COALESCE($6, 'planning'),
                COALESCE($7, 'medium'), $8, $9, $10, $11, $12, $13, $14, COALESCE($15, 0),
                $16, $17, $18, COALESCE($19, '{{}}'), $20, $21, $22
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.project_number)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.project_type)
            .bind(&input.tags)
            .bind(input.status.map(ProjectStatus::as_str))
            .bind(input.priority.map(ProjectPriority::as_str))
            .bind(input.start_date)
            .bind(input.estimated_end_date)
            .bind(input.actual_end_date)
            .bind(input.budget)
            .bind(input.actual_cost)
            .bind(input.estimated_revenue)
            .bind(input.actual_revenue)
            .bind(input.progress)
            .bind(input.client_id)
            .bind(input.project_manager_id)
            .bind(input.contractor_id)
            .bind(&input.team_member_ids)
            .bind(input.risk_level.map(RiskLevel::as_str))
            .bind(input.quality_score)
            .bind(input.client_satisfaction)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of projects matching `filters`, plus the total match count.
    ///
    /// The page and the count are fetched concurrently. A page past the end
    /// yields an empty vector alongside the real total.
    pub async fn list(
        pool: &PgPool,
        filters: &ProjectFilters,
        sort: ProjectSort,
        page: PageRequest,
    ) -> Result<(Vec<Project>, i64), sqlx::Error> {
        let mut items_query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM projects WHERE 1=1"));
        push_filters(&mut items_query, filters);
        let direction = sort.order.as_sql();
        items_query.push(format!(
            " ORDER BY {} {direction} NULLS LAST, id {direction}",
            sort.key.column()
        ));
        items_query.push(" LIMIT ");
        items_query.push_bind(page.limit);
        items_query.push(" OFFSET ");
        items_query.push_bind(page.offset());

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM projects WHERE 1=1");
        push_filters(&mut count_query, filters);

        tokio::try_join!(
            items_query.build_query_as::<Project>().fetch_all(pool),
            count_query.build_query_scalar::<i64>().fetch_one(pool),
        )
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    /// Setting the status to `completed` has the same side effects as
    /// [`ProjectRepo::update_status`].
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                project_type = COALESCE($4, project_type),
                tags = COALESCE($5, tags),
                status = COALESCE($6, status),
                priority = COALESCE($7, priority),
                start_date = COALESCE($8, start_date),
                estimated_end_date = COALESCE($9, estimated_end_date),
                actual_end_date = CASE WHEN $6 = 'completed'
                                       THEN COALESCE($10, actual_end_date, CURRENT_DATE)
                                       ELSE COALESCE($10, actual_end_date) END,
                budget = COALESCE($11, budget),
                actual_cost = COALESCE($12, actual_cost),
                estimated_revenue = COALESCE($13, estimated_revenue),
                actual_revenue = COALESCE($14, actual_revenue),
                progress = CASE WHEN $6 = 'completed' THEN 100 ELSE COALESCE($15, progress) END,
                client_id = COALESCE($16, client_id),
                project_manager_id = COALESCE($17, project_manager_id),
                contractor_id = COALESCE($18, contractor_id),
                team_member_ids = COALESCE($19, team_member_ids),
                risk_level = COALESCE($20, risk_level),
                quality_score = COALESCE($21, quality_score),
                client_satisfaction = COALESCE($22, client_satisfaction)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.project_type)
            .bind(&input.tags)
            .bind(input.status.map(ProjectStatus::as_str))
            .bind(input.priority.map(ProjectPriority::as_str))
            .bind(input.start_date)
            .bind(input.estimated_end_date)
            .bind(input.actual_end_date)
            .bind(input.budget)
            .bind(input.actual_cost)
            .bind(input.estimated_revenue)
            .bind(input.actual_revenue)
            .bind(input.progress)
            .bind(input.client_id)
            .bind(input.project_manager_id)
            .bind(input.contractor_id)
            .bind(&input.team_member_ids)
            .bind(input.risk_level.map(RiskLevel::as_str))
            .bind(input.quality_score)
            .bind(input.client_satisfaction)
            .fetch_optional(pool)
            .await
    }

    /// Set the status. Completing a project also pins progress at 100 and
    /// stamps `actual_end_date` if it was empty.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                status = $2,
                progress = CASE WHEN $2 = 'completed' THEN 100 ELSE progress END,
                actual_end_date = CASE WHEN $2 = 'completed'
                                       THEN COALESCE(actual_end_date, CURRENT_DATE)
                                       ELSE actual_end_date END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        progress: i32,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("UPDATE projects SET progress = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(progress)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recently created projects, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        visible_to: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM projects WHERE 1=1"));
        push_visibility(&mut query, visible_to);
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(limit);
        query.build_query_as::<Project>().fetch_all(pool).await
    }

    /// Projects past their estimated end that are not completed, most
    /// overdue first.
    pub async fn list_overdue(
        pool: &PgPool,
        visible_to: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {COLUMNS} FROM projects WHERE {OVERDUE_PREDICATE}"
        ));
        push_visibility(&mut query, visible_to);
        query.push(" ORDER BY estimated_end_date ASC, id ASC LIMIT ");
        query.push_bind(limit);
        query.build_query_as::<Project>().fetch_all(pool).await
    }

    /// The stats-relevant columns of every project visible to `visible_to`
    /// (all projects when `None`).
    pub async fn snapshots(
        pool: &PgPool,
        visible_to: Option<DbId>,
    ) -> Result<Vec<ProjectSnapshot>, sqlx::Error> {
        let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM projects WHERE 1=1"));
        push_visibility(&mut query, visible_to);
        let rows = query.build_query_as::<Project>().fetch_all(pool).await?;
        Ok(rows
            .into_iter()
            .map(|p| ProjectSnapshot {
                status: p.status,
                progress: p.progress,
                budget: p.budget,
                actual_cost: p.actual_cost,
                actual_revenue: p.actual_revenue,
            })
            .collect())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &ProjectFilters) {
    if let Some(status) = filters.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
    if let Some(ref project_type) = filters.project_type {
        query.push(" AND project_type = ");
        query.push_bind(project_type.clone());
    }
    if let Some(priority) = filters.priority {
        query.push(" AND priority = ");
        query.push_bind(priority.as_str());
    }
    if let Some(client_id) = filters.client_id {
        query.push(" AND client_id = ");
        query.push_bind(client_id);
    }
    if let Some(manager_id) = filters.project_manager_id {
        query.push(" AND project_manager_id = ");
        query.push_bind(manager_id);
    }
    if let Some(pattern) = filters.search.as_deref().and_then(search_pattern) {
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR description ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR project_number ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    if let Some(start) = filters.start_date {
        query.push(" AND start_date >= ");
        query.push_bind(start);
    }
    if let Some(end) = filters.end_date {
        query.push(" AND estimated_end_date <= ");
        query.push_bind(end);
    }
    push_visibility(query, filters.visible_to);
}

fn push_visibility(query: &mut QueryBuilder<'_, Postgres>, visible_to: Option<DbId>) {
    if let Some(user_id) = visible_to {
        query.push(" AND (project_manager_id = ");
        query.push_bind(user_id);
        query.push(" OR ");
        query.push_bind(user_id);
        query.push(" = ANY(team_member_ids))");
    }
}

/// `%term%` for an `ILIKE` match, with the LIKE wildcards in `term` escaped.
/// Blank terms produce no predicate.
pub(crate) fn search_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}
