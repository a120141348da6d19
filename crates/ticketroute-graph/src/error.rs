//! Error types for Graph operations.

use ticketroute_core::RemoteError;

/// Result type alias for Graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Graph client error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport error (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from Graph.
    #[error("Graph error {status} ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Graph error code (e.g., `ErrorItemNotFound`).
        code: String,
        /// Human-readable message from Graph.
        message: String,
    },

    /// The access token is past its expiry.
    #[error("Access token expired")]
    TokenExpired,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Creates an API error from its parts.
    #[must_use]
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// HTTP status associated with the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::TokenExpired => Some(401),
            _ => None,
        }
    }
}

impl From<Error> for RemoteError {
    fn from(err: Error) -> Self {
        match err {
            Error::Api {
                status,
                code,
                message,
            } => Self::new(message).with_status(status).with_code(code),
            other => {
                let status = other.status();
                let remote = Self::new(other.to_string());
                match status {
                    Some(status) => remote.with_status(status),
                    None => remote,
                }
            }
        }
    }
}
