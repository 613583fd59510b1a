//! REST client for the `/api/v1` endpoints.
//!
//! Every authenticated call goes through [`ApiClient::execute`]: a `401`
//! triggers one refresh of the stored session and one retry. If the retry
//! is rejected too, or the refresh itself is refused, the session is
//! cleared and the call fails with [`ClientError::SessionExpired`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use buildcrm_core::pagination::{Pagination, SortOrder};
use buildcrm_core::stats::{ClientStats, ProjectStats};
use buildcrm_core::status::{ClientStatus, ProjectStatus};
use buildcrm_core::types::DbId;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ClientError;
use crate::refresh::AutoRefresh;
use crate::session::{ClientSession, SessionUser, TokenStore};

/// HTTP client for one BuildCRM server.
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
    store: Arc<dyn TokenStore>,
    /// Serializes token exchanges so a rotated refresh token is never
    /// presented twice.
    refresh_lock: tokio::sync::Mutex<()>,
    auto_refresh: Mutex<Option<AutoRefresh>>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload {
    user: SessionUser,
    token: String,
    refresh_token: String,
    expires_in: i64,
}

impl AuthPayload {
    fn into_session(self) -> ClientSession {
        ClientSession {
            user: self.user,
            token: self.token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(self.expires_in),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct ProjectEnvelope {
    project: Value,
}

#[derive(Debug, Deserialize)]
struct ClientEnvelope {
    client: Value,
}

/// One page of `GET /projects`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<Value>,
    pub pagination: Pagination,
}

/// One page of `GET /clients`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientList {
    pub clients: Vec<Value>,
    pub pagination: Pagination,
}

/// `GET /projects/stats` body: the aggregate plus its completion rate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatsView {
    #[serde(flatten)]
    pub stats: ProjectStats,
    pub completion_rate: f64,
}

/// Query string for the list endpoints. Unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl ApiClient {
    /// Create a client for the server at `base_url`, e.g.
    /// `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, store)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            api_url: format!("{}/api/v1", base_url.trim_end_matches('/')),
            store,
            refresh_lock: tokio::sync::Mutex::new(()),
            auto_refresh: Mutex::new(None),
        }
    }

    /// The session currently held by the store, if any.
    pub fn session(&self) -> Option<ClientSession> {
        self.store.load()
    }

    // ---- authentication ----

    /// Log in and store the resulting session.
    pub async fn login(&self, email: &str, password: &str) -> Result<ClientSession, ClientError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let payload: Envelope<AuthPayload> = Self::parse_response(response).await?;
        let session = payload.data.into_session();
        self.store.save(session.clone());
        tracing::info!(user_id = session.user.id, "Logged in");
        Ok(session)
    }

    /// Exchange the stored refresh token for a new session.
    ///
    /// A refused exchange clears the store and returns
    /// [`ClientError::SessionExpired`].
    pub async fn refresh(&self) -> Result<ClientSession, ClientError> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.store.load().ok_or(ClientError::NotLoggedIn)?;
        self.exchange(&current).await
    }

    /// End the session: stop auto-refresh, revoke server-side, clear the
    /// store. Server errors are logged, not returned.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.stop_auto_refresh();
        let _guard = self.refresh_lock.lock().await;

        if let Some(session) = self.store.load() {
            let result = self
                .client
                .post(self.url("/auth/logout"))
                .bearer_auth(&session.token)
                .json(&json!({}))
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    tracing::warn!(status = response.status().as_u16(), "Server-side logout failed")
                }
                Err(e) => tracing::warn!(error = %e, "Server-side logout failed"),
            }
        }

        self.store.clear();
        Ok(())
    }

    /// Refresh the session every `interval` until logout or
    /// [`ApiClient::stop_auto_refresh`]. Calling it again restarts the
    /// schedule.
    pub fn start_auto_refresh(self: &Arc<Self>, interval: Duration) {
        let task = AutoRefresh::spawn(Arc::downgrade(self), interval);
        let previous = self.auto_refresh_slot().replace(task);
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    pub fn stop_auto_refresh(&self) {
        if let Some(task) = self.auto_refresh_slot().take() {
            task.stop();
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh_slot()
            .as_ref()
            .is_some_and(|task| task.is_running())
    }

    /// Current user profile.
    pub async fn me(&self) -> Result<SessionUser, ClientError> {
        let body: UserEnvelope = self.request_data(Method::GET, "/auth/me", None).await?;
        Ok(body.user)
    }

    // ---- projects ----

    pub async fn list_projects(&self, query: &ProjectQuery) -> Result<ProjectList, ClientError> {
        let response = self
            .execute(Method::GET, "/projects", None, Some(query))
            .await?;
        Self::parse_data(response).await
    }

    pub async fn get_project(&self, id: DbId) -> Result<Value, ClientError> {
        let body: ProjectEnvelope = self
            .request_data(Method::GET, &format!("/projects/{id}"), None)
            .await?;
        Ok(body.project)
    }

    pub async fn create_project(&self, input: &Value) -> Result<Value, ClientError> {
        let body: ProjectEnvelope = self
            .request_data(Method::POST, "/projects", Some(input))
            .await?;
        Ok(body.project)
    }

    pub async fn update_project(&self, id: DbId, input: &Value) -> Result<Value, ClientError> {
        let body: ProjectEnvelope = self
            .request_data(Method::PUT, &format!("/projects/{id}"), Some(input))
            .await?;
        Ok(body.project)
    }

    pub async fn update_project_status(
        &self,
        id: DbId,
        status: ProjectStatus,
    ) -> Result<Value, ClientError> {
        let body: ProjectEnvelope = self
            .request_data(
                Method::PATCH,
                &format!("/projects/{id}/status"),
                Some(&json!({ "status": status })),
            )
            .await?;
        Ok(body.project)
    }

    pub async fn update_project_progress(&self, id: DbId, progress: i32) -> Result<Value, ClientError> {
        let body: ProjectEnvelope = self
            .request_data(
                Method::PATCH,
                &format!("/projects/{id}/progress"),
                Some(&json!({ "progress": progress })),
            )
            .await?;
        Ok(body.project)
    }

    pub async fn delete_project(&self, id: DbId) -> Result<(), ClientError> {
        let response = self
            .execute(Method::DELETE, &format!("/projects/{id}"), None, None::<&()>)
            .await?;
        Self::check_status(response).await
    }

    // ---- clients ----

    pub async fn list_clients(&self, page: i64, limit: i64) -> Result<ClientList, ClientError> {
        let response = self
            .execute(
                Method::GET,
                "/clients",
                None,
                Some(&[("page", page), ("limit", limit)]),
            )
            .await?;
        Self::parse_data(response).await
    }

    pub async fn get_client(&self, id: DbId) -> Result<Value, ClientError> {
        let body: ClientEnvelope = self
            .request_data(Method::GET, &format!("/clients/{id}"), None)
            .await?;
        Ok(body.client)
    }

    pub async fn create_client(&self, input: &Value) -> Result<Value, ClientError> {
        let body: ClientEnvelope = self
            .request_data(Method::POST, "/clients", Some(input))
            .await?;
        Ok(body.client)
    }

    pub async fn update_client_status(
        &self,
        id: DbId,
        status: ClientStatus,
    ) -> Result<Value, ClientError> {
        let body: ClientEnvelope = self
            .request_data(
                Method::PATCH,
                &format!("/clients/{id}/status"),
                Some(&json!({ "status": status })),
            )
            .await?;
        Ok(body.client)
    }

    // ---- stats ----

    pub async fn project_stats(&self) -> Result<ProjectStatsView, ClientError> {
        self.request_data(Method::GET, "/projects/stats", None).await
    }

    pub async fn client_stats(&self) -> Result<ClientStats, ClientError> {
        self.request_data(Method::GET, "/clients/stats", None).await
    }

    /// Dashboard summary. The shape depends on the caller's role, so it is
    /// returned untyped.
    pub async fn dashboard(&self) -> Result<Value, ClientError> {
        self.request_data(Method::GET, "/dashboard", None).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn auto_refresh_slot(&self) -> std::sync::MutexGuard<'_, Option<AutoRefresh>> {
        self.auto_refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn request_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        let response = self.execute(method, path, body, None::<&()>).await?;
        Self::parse_data(response).await
    }

    /// Send an authenticated request, refreshing and retrying once on `401`.
    async fn execute<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&Q>,
    ) -> Result<reqwest::Response, ClientError> {
        let session = self.store.load().ok_or(ClientError::NotLoggedIn)?;

        let response = self
            .send(method.clone(), path, body, query, &session.token)
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(path, "Access token rejected, refreshing");
        let renewed = self.renew_after_rejection(&session.token).await?;

        let retry = self.send(method, path, body, query, &renewed.token).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "Request rejected after refresh, logging out");
            self.force_logout();
            return Err(ClientError::SessionExpired);
        }
        Ok(retry)
    }

    async fn send<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&Q>,
        token: &str,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Refresh after `rejected` bounced, unless another caller already
    /// replaced it while this one waited for the lock.
    async fn renew_after_rejection(&self, rejected: &str) -> Result<ClientSession, ClientError> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.store.load().ok_or(ClientError::SessionExpired)?;
        if current.token != rejected {
            return Ok(current);
        }
        self.exchange(&current).await
    }

    /// Call `/auth/refresh`. Caller holds `refresh_lock`.
    async fn exchange(&self, current: &ClientSession) -> Result<ClientSession, ClientError> {
        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&json!({ "refreshToken": current.refresh_token }))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::info!(
                    user_id = current.user.id,
                    status = response.status().as_u16(),
                    "Refresh refused, logging out"
                );
                self.force_logout();
                return Err(ClientError::SessionExpired);
            }
            _ => {}
        }

        let payload: Envelope<AuthPayload> = Self::parse_response(response).await?;
        let session = payload.data.into_session();
        self.store.save(session.clone());
        tracing::debug!(user_id = session.user.id, "Session refreshed");
        Ok(session)
    }

    fn force_logout(&self) {
        self.stop_auto_refresh();
        self.store.clear();
    }

    /// Ensure the response has a success status code. On failure, decode
    /// the server's `{error, code}` body when present.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.code, body.error),
            Err(_) => ("UNKNOWN".to_string(), text),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Parse a `{"data": ...}` envelope.
    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let envelope: Envelope<T> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
