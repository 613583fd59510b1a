//! Route definitions for the `/clients` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::{client, stats};
use crate::state::AppState;

/// Routes mounted at `/clients`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> create
/// GET    /stats           -> client_stats
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// PATCH  /{id}/status     -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(client::list).post(client::create))
        .route("/stats", get(stats::client_stats))
        .route(
            "/{id}",
            get(client::get_by_id)
                .put(client::update)
                .delete(client::delete),
        )
        .route("/{id}/status", patch(client::update_status))
}
