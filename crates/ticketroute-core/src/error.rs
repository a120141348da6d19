//! Error types for the core library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in ticket operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input could not be used (e.g. no tracking id in the subject).
    #[error("{0}")]
    Validation(String),

    /// A well-known folder is missing from the remote mailbox.
    #[error("{0}")]
    Integrity(String),

    /// The remote mailbox API rejected or failed a call.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The operation did not finish within its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an integrity error.
    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Classifies the error for transports that map it onto status codes.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::Remote(_) => ErrorKind::Remote,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected request, not retried.
    Validation,
    /// Unexpected remote state, not retried.
    Integrity,
    /// Failure reported by the remote mailbox API.
    Remote,
    /// Deadline exceeded.
    Timeout,
}

impl ErrorKind {
    /// HTTP-style status code a transport would answer with.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Integrity => 404,
            Self::Remote => 502,
            Self::Timeout => 504,
        }
    }
}

/// Failure reported by a mailbox backend.
///
/// Carries the backend's own detail unmodified so it can be shown to the
/// caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// Human-readable detail from the backend.
    pub message: String,
    /// HTTP status, when the backend speaks HTTP.
    pub status: Option<u16>,
    /// Service-specific error code (e.g. `ErrorItemNotFound`).
    pub code: Option<String>,
}

impl RemoteError {
    /// Creates a remote error with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
        }
    }

    /// Sets the HTTP status.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the service error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by mailbox backends.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_map_to_status_codes() {
        assert_eq!(Error::validation("x").kind().status_code(), 400);
        assert_eq!(Error::integrity("x").kind().status_code(), 404);
        assert_eq!(
            Error::from(RemoteError::new("boom")).kind(),
            ErrorKind::Remote
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn test_remote_error_detail_is_propagated_verbatim() {
        let err = Error::from(
            RemoteError::new("Access is denied.")
                .with_status(403)
                .with_code("ErrorAccessDenied"),
        );
        assert_eq!(err.to_string(), "Access is denied.");

        let Error::Remote(remote) = err else {
            panic!("expected remote error");
        };
        assert_eq!(remote.status, Some(403));
        assert_eq!(remote.code.as_deref(), Some("ErrorAccessDenied"));
    }
}
