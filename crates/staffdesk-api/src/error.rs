use thiserror::Error;

/// Top-level error type for the `staffdesk-api` crate.
///
/// Covers every failure mode of a single HTTP exchange: transport,
/// URL construction, non-success status codes, and body decoding.
/// `staffdesk-core` maps these into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing or joining error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to build the underlying HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Server responses ────────────────────────────────────────────
    /// 401 from the server.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// 404 from the server.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// 400 / 422: the server rejected the submitted payload.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// Field-level messages, if the server supplied any.
        fields: Vec<(String, String)>,
    },

    /// Any other non-success status.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    /// HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Validation { .. } => Some(422),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
