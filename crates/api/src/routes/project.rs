//! Route definitions for the `/projects` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::{project, stats};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> create
/// GET    /stats           -> project_stats
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// PATCH  /{id}/status     -> update_status
/// PATCH  /{id}/progress   -> update_progress
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/stats", get(stats::project_stats))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/status", patch(project::update_status))
        .route("/{id}/progress", patch(project::update_progress))
}
