//! Shared query parameter types for API handlers.
//!
//! Each list endpoint declares its own flat struct because `serde(flatten)`
//! loses the string-to-number coercion that query strings rely on.

use buildcrm_core::pagination::{PageRequest, SortOrder};
use buildcrm_core::status::{ClientSource, ClientStatus, ProjectPriority, ProjectStatus};
use buildcrm_core::types::{Date, DbId};
use buildcrm_db::models::client::{ClientFilters, ClientSort, ClientSortKey};
use buildcrm_db::models::project::{ProjectFilters, ProjectSort, ProjectSortKey};
use serde::Deserialize;

/// Generic pagination parameters (`?page=&limit=`).
///
/// Values are clamped by [`PageRequest::new`].
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Query parameters for `GET /projects`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<ProjectStatus>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub priority: Option<ProjectPriority>,
    pub client_id: Option<DbId>,
    pub project_manager_id: Option<DbId>,
    pub search: Option<String>,
    pub sort_by: Option<ProjectSortKey>,
    pub sort_order: Option<SortOrder>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl ProjectListParams {
    /// Split into repository inputs. `visible_to` is set from the session,
    /// never from the query string.
    pub fn into_parts(self, visible_to: Option<DbId>) -> (ProjectFilters, ProjectSort, PageRequest) {
        let page = PageRequest::new(self.page, self.limit);
        let sort = ProjectSort {
            key: self.sort_by.unwrap_or_default(),
            order: self.sort_order.unwrap_or_default(),
        };
        let filters = ProjectFilters {
            status: self.status,
            project_type: non_blank(self.project_type),
            priority: self.priority,
            client_id: self.client_id,
            project_manager_id: self.project_manager_id,
            search: non_blank(self.search),
            start_date: self.start_date,
            end_date: self.end_date,
            visible_to,
        };
        (filters, sort, page)
    }
}

/// Query parameters for `GET /clients`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<ClientStatus>,
    pub source: Option<ClientSource>,
    pub assigned_to: Option<DbId>,
    pub search: Option<String>,
    pub sort_by: Option<ClientSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl ClientListParams {
    pub fn into_parts(self) -> (ClientFilters, ClientSort, PageRequest) {
        let page = PageRequest::new(self.page, self.limit);
        let sort = ClientSort {
            key: self.sort_by.unwrap_or_default(),
            order: self.sort_order.unwrap_or_default(),
        };
        let filters = ClientFilters {
            status: self.status,
            source: self.source,
            assigned_to: self.assigned_to,
            search: non_blank(self.search),
        };
        (filters, sort, page)
    }
}

/// Treat `?search=` and `?search=%20` as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
