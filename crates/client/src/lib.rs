//! Typed HTTP client for the BuildCRM REST API.
//!
//! [`ApiClient`] keeps the current [`ClientSession`] in an injected
//! [`TokenStore`], retries once after refreshing when a request comes back
//! `401`, and can run a background task that refreshes the session on a
//! fixed interval.

pub mod api;
pub mod error;
pub mod refresh;
pub mod session;

pub use api::{ApiClient, ClientList, ProjectList, ProjectQuery, ProjectStatsView};
pub use error::ClientError;
pub use refresh::AutoRefresh;
pub use session::{ClientSession, MemoryTokenStore, SessionUser, TokenStore};
