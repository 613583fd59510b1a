//! Refresh-token session model and DTOs.

use buildcrm_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A session row from the `user_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A freshly minted refresh token, stored only as its hash.
pub struct NewRefreshToken {
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}

/// What happened to a presented refresh token.
#[derive(Debug)]
pub enum Rotation {
    /// The token was live and has been replaced by this session.
    Rotated(UserSession),
    /// The token was already spent. The owner's other sessions are suspect.
    Replayed { user_id: DbId },
    /// Unknown or expired token.
    Rejected,
}
