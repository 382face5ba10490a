//! Shared error type across notifyhub crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Hub is not accepting work (shutting down).
    ServiceUnavailable,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("hub closed")]
    HubClosed,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl NotifyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            NotifyError::BadRequest(_) => ClientCode::BadRequest,
            NotifyError::HubClosed => ClientCode::ServiceUnavailable,
            NotifyError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            NotifyError::Internal(_) => ClientCode::Internal,
        }
    }
}
