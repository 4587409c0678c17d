// ── Core error types ──
//
// Domain errors surfaced by controllers, the fetch cache, and the
// accumulator. Consumers never see reqwest types directly; the
// `From<staffdesk_api::Error>` impl translates transport-layer errors.

use std::sync::Arc;

use thiserror::Error;

/// Coarse classification used by the presentation layer to pick a
/// notification style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or transport failure; the request may succeed if retried.
    Transport,
    /// Server rejected a mutation payload.
    Validation,
    /// A page fetch failed while accumulating a whole collection.
    Accumulator,
    /// Everything else (decoding, configuration, not-found, ...).
    Other,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport errors ─────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    // ── Server errors ────────────────────────────────────────────────
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        fields: Vec<(String, String)>,
    },

    #[error("Server error: {message}")]
    Server { message: String, status: Option<u16> },

    // ── Data errors ──────────────────────────────────────────────────
    /// The response body did not match the shape the adapter expects.
    #[error("Unexpected response shape from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// A page of an exhaustive accumulation failed. The already fetched
    /// prefix stays available on the accumulator.
    #[error("Failed to load page {page} of {endpoint}")]
    Accumulator {
        endpoint: String,
        page: u32,
        #[source]
        source: Arc<CoreError>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => ErrorKind::Transport,
            Self::Server { status, .. } if status.is_none_or(|s| s >= 500) => ErrorKind::Transport,
            Self::ValidationFailed { .. } => ErrorKind::Validation,
            Self::Accumulator { .. } => ErrorKind::Accumulator,
            _ => ErrorKind::Other,
        }
    }

    /// Human-readable message suitable for a toast or status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed { message, .. }
            | Self::Server { message, .. }
            | Self::Unauthorized { message } => message.clone(),
            Self::Accumulator { source, .. } => source.user_message(),
            other => other.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<staffdesk_api::Error> for CoreError {
    fn from(err: staffdesk_api::Error) -> Self {
        match err {
            staffdesk_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Server {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            staffdesk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            staffdesk_api::Error::ClientBuild(message) => CoreError::Config { message },
            staffdesk_api::Error::Unauthorized { message } => CoreError::Unauthorized { message },
            staffdesk_api::Error::NotFound { path } => CoreError::NotFound { path },
            staffdesk_api::Error::Validation { message, fields } => {
                CoreError::ValidationFailed { message, fields }
            }
            staffdesk_api::Error::Server { status, message } => CoreError::Server {
                message,
                status: Some(status),
            },
            staffdesk_api::Error::Deserialization { message, body: _ } => CoreError::Decode {
                endpoint: String::new(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_through() {
        let err = CoreError::from(staffdesk_api::Error::Validation {
            message: "Name is required".into(),
            fields: vec![("Name".into(), "Required".into())],
        });
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Name is required");
    }

    #[test]
    fn server_5xx_is_transport() {
        let err = CoreError::from(staffdesk_api::Error::Server {
            status: 502,
            message: "bad gateway".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = CoreError::from(staffdesk_api::Error::Server {
            status: 409,
            message: "conflict".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn accumulator_wraps_source() {
        let err = CoreError::Accumulator {
            endpoint: "api/departments".into(),
            page: 3,
            source: Arc::new(CoreError::Timeout),
        };
        assert_eq!(err.kind(), ErrorKind::Accumulator);
        assert_eq!(err.to_string(), "Failed to load page 3 of api/departments");
        assert_eq!(err.user_message(), "Request timed out");
    }
}
