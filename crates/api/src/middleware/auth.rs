//! JWT-based session extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use buildcrm_core::error::CoreError;
use buildcrm_core::roles::{Capabilities, Capability};
use buildcrm_core::status::Role;
use buildcrm_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller of a request, built from the Bearer token in the
/// `Authorization` header.
///
/// The capability set is looked up from the role table once, when the
/// session is extracted:
///
/// ```ignore
/// async fn my_handler(session: Session) -> AppResult<Json<()>> {
///     session.require(Capability::ManageProjects)?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Session {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub role: Role,
    pub capabilities: Capabilities,
}

impl Session {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self {
            user_id,
            role,
            capabilities: role.capabilities(),
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.allows(capability)
    }

    /// Reject with 403 unless the session holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "Role '{}' is not permitted to perform this action",
                self.role
            ))))
        }
    }

    /// Project visibility scope for list and dashboard queries: `None` sees
    /// everything, `Some(user_id)` only projects the user works on.
    pub fn project_scope(&self) -> Option<DbId> {
        if self.can(Capability::ViewAllProjects) {
            None
        } else {
            Some(self.user_id)
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(Session::new(claims.sub, claims.role))
    }
}
