pub mod auth;
pub mod client;
pub mod health;
pub mod project;
pub mod user;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                        login (public)
/// /auth/refresh                      refresh (public)
/// /auth/logout                       logout (requires auth)
/// /auth/me                           current user (requires auth)
///
/// /projects                          list, create
/// /projects/stats                    aggregate stats (ViewFinancials)
/// /projects/{id}                     get, update, delete
/// /projects/{id}/status              status transition (PATCH)
/// /projects/{id}/progress            progress report (PATCH)
/// /project-stats                     alias of /projects/stats
///
/// /clients                           list, create
/// /clients/stats                     aggregate stats (ViewFinancials)
/// /clients/{id}                      get, update, delete
/// /clients/{id}/status               status change (PATCH)
/// /client-stats                      alias of /clients/stats
///
/// /dashboard                         summary (requires auth)
///
/// /users                             list, create (ManageUsers)
/// /users/{id}                        get, update, deactivate
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .route("/project-stats", get(handlers::stats::project_stats))
        .nest("/clients", client::router())
        .route("/client-stats", get(handlers::stats::client_stats))
        .route("/dashboard", get(handlers::dashboard::summary))
        .nest("/users", user::router())
}
