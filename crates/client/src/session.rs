//! Session state and the storage seam it lives behind.

use std::sync::RwLock;

use buildcrm_core::roles::Capabilities;
use buildcrm_core::status::Role;
use buildcrm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// The authenticated user as reported by the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl SessionUser {
    /// What this user may do, from the shared role table.
    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }
}

/// A live login: tokens plus the user they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSession {
    pub user: SessionUser,
    pub token: String,
    pub refresh_token: String,
    /// When the access token stops being accepted.
    pub expires_at: Timestamp,
}

impl ClientSession {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Where the client keeps its session between requests.
///
/// Implementations must be cheap to call; the client reads the store on
/// every request.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<ClientSession>;
    fn save(&self, session: ClientSession);
    fn clear(&self);
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<Option<ClientSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: ClientSession) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<ClientSession> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn save(&self, session: ClientSession) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
    }

    fn clear(&self) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
