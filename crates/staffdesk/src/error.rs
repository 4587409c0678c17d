//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use staffdesk_config::ConfigError;
use staffdesk_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(staffdesk::connection_failed),
        help(
            "Check that the API is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(staffdesk::timeout),
        help("Increase the timeout with --timeout or check API responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authorized: {message}")]
    #[diagnostic(
        code(staffdesk::unauthorized),
        help("Configure an authorization header: staffdesk config set header.Authorization \"Bearer <token>\"")
    )]
    Unauthorized { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {path}")]
    #[diagnostic(
        code(staffdesk::not_found),
        help("Check the collection path and id. Run: staffdesk list <resource>")
    )]
    NotFound { path: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(staffdesk::rejected), help("{details}"))]
    Rejected { message: String, details: String },

    #[error("API error: {message}")]
    #[diagnostic(code(staffdesk::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(staffdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(staffdesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: staffdesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API configured")]
    #[diagnostic(
        code(staffdesk::no_config),
        help(
            "Create a profile with: staffdesk config init\n\
             or pass --base-url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(staffdesk::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(staffdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(staffdesk::json), help("Check the JSON body and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(staffdesk::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Unauthorized { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}

/// Cache entries hand out shared errors, so the mapping works on a borrow.
impl From<&CoreError> for CliError {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Unauthorized { message } => CliError::Unauthorized {
                message: message.clone(),
            },
            CoreError::NotFound { path } => CliError::NotFound { path: path.clone() },
            CoreError::ValidationFailed { message, fields } => CliError::Rejected {
                message: message.clone(),
                details: fields
                    .iter()
                    .map(|(field, reason)| format!("{field}: {reason}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            CoreError::Accumulator { .. } => CliError::ApiError {
                message: format!("{err}: {}", err.user_message()),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message.clone(),
            },
            CoreError::Server { .. } | CoreError::Decode { .. } => CliError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<std::sync::Arc<CoreError>> for CliError {
    fn from(err: std::sync::Arc<CoreError>) -> Self {
        Self::from(err.as_ref())
    }
}
