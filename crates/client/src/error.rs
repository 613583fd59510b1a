/// Errors from the BuildCRM client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        /// Machine-readable code from the error body, `UNKNOWN` if absent.
        code: String,
        message: String,
    },

    /// No session is stored; log in first.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The session could not be renewed and has been cleared.
    #[error("Session expired, please log in again")]
    SessionExpired,
}

impl ClientError {
    /// HTTP status of an [`ClientError::Api`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
