//! Repository for the `clients` table.

use buildcrm_core::pagination::PageRequest;
use buildcrm_core::status::{ClientSource, ClientStatus};
use buildcrm_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::project_repo::search_pattern;
use crate::models::client::{Client, ClientFilters, ClientSort, CreateClient, UpdateClient};

const COLUMNS: &str = "id, company_name, contact_name, email, phone, address, city, state, \
                       postal_code, industry, status, source, rating, estimated_value, tags, \
                       notes, last_contact_date, next_follow_up_date, assigned_to, created_at, \
                       updated_at";

/// Provides CRUD and listing for clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Insert a new client, returning the created row. Status defaults to `lead`.
    pub async fn create(pool: &PgPool, input: &CreateClient) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (
                company_name, contact_name, email, phone, address, city, state, postal_code,
                industry, status, source, rating, estimated_value, tags, notes,
                last_contact_date, next_follow_up_date, assigned_to
             ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, 'lead'), $11, $12, $13,
                COALESCE($14, '{{}}'), $15, $16, $17, $18
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(&input.company_name)
            .bind(&input.contact_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.postal_code)
            .bind(&input.industry)
            .bind(input.status.map(ClientStatus::as_str))
            .bind(input.source.map(ClientSource::as_str))
            .bind(input.rating)
            .bind(input.estimated_value)
            .bind(&input.tags)
            .bind(&input.notes)
            .bind(input.last_contact_date)
            .bind(input.next_follow_up_date)
            .bind(input.assigned_to)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of clients matching `filters`, plus the total match count.
    pub async fn list(
        pool: &PgPool,
        filters: &ClientFilters,
        sort: ClientSort,
        page: PageRequest,
    ) -> Result<(Vec<Client>, i64), sqlx::Error> {
        let mut items_query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM clients WHERE 1=1"));
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

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM clients WHERE 1=1");
        push_filters(&mut count_query, filters);

        tokio::try_join!(
            items_query.build_query_as::<Client>().fetch_all(pool),
            count_query.build_query_scalar::<i64>().fetch_one(pool),
        )
    }

    /// Update a client. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateClient,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET
                company_name = COALESCE($2, company_name),
                contact_name = COALESCE($3, contact_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                city = COALESCE($7, city),
                state = COALESCE($8, state),
                postal_code = COALESCE($9, postal_code),
                industry = COALESCE($10, industry),
                status = COALESCE($11, status),
                source = COALESCE($12, source),
                rating = COALESCE($13, rating),
                estimated_value = COALESCE($14, estimated_value),
                tags = COALESCE($15, tags),
                notes = COALESCE($16, notes),
                last_contact_date = COALESCE($17, last_contact_date),
                next_follow_up_date = COALESCE($18, next_follow_up_date),
                assigned_to = COALESCE($19, assigned_to)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(&input.company_name)
            .bind(&input.contact_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.postal_code)
            .bind(&input.industry)
            .bind(input.status.map(ClientStatus::as_str))
            .bind(input.source.map(ClientSource::as_str))
            .bind(input.rating)
            .bind(input.estimated_value)
            .bind(&input.tags)
            .bind(&input.notes)
            .bind(input.last_contact_date)
            .bind(input.next_follow_up_date)
            .bind(input.assigned_to)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: ClientStatus,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("UPDATE clients SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a client. Linked projects keep a NULL `client_id`.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &ClientFilters) {
    if let Some(status) = filters.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
    if let Some(source) = filters.source {
        query.push(" AND source = ");
        query.push_bind(source.as_str());
    }
    if let Some(assigned_to) = filters.assigned_to {
        query.push(" AND assigned_to = ");
        query.push_bind(assigned_to);
    }
    if let Some(pattern) = filters.search.as_deref().and_then(search_pattern) {
        query.push(" AND (company_name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR contact_name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR email ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}
