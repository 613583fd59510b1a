//! Capability-gated extractors.
//!
//! Each extractor wraps [`Session`] and rejects requests whose role lacks a
//! capability. Use these in route handlers to enforce authorization at the
//! type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use buildcrm_core::roles::Capability;

use super::auth::Session;
use crate::error::AppError;
use crate::state::AppState;

macro_rules! require_capability {
    ($(#[$meta:meta])* $name:ident => $capability:expr) => {
        $(#[$meta])*
        pub struct $name(pub Session);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let session = Session::from_request_parts(parts, state).await?;
                session.require($capability)?;
                Ok($name(session))
            }
        }
    };
}

require_capability! {
    /// Create and edit projects. Rejects with 403 otherwise.
    ///
    /// ```ignore
    /// async fn create(RequireManageProjects(session): RequireManageProjects) -> AppResult<Json<()>> {
    ///     Ok(Json(()))
    /// }
    /// ```
    RequireManageProjects => Capability::ManageProjects
}

require_capability! {
    RequireDeleteProjects => Capability::DeleteProjects
}

require_capability! {
    /// Create and edit clients.
    RequireManageClients => Capability::ManageClients
}

require_capability! {
    RequireDeleteClients => Capability::DeleteClients
}

require_capability! {
    /// Budget, cost, and revenue aggregates.
    RequireViewFinancials => Capability::ViewFinancials
}

require_capability! {
    /// User administration (admin only).
    RequireManageUsers => Capability::ManageUsers
}
