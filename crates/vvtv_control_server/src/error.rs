//! Error types for the control server.

use crate::config::ConfigError;
use thiserror::Error;
use vvtv_auth::AuthRejection;
use vvtv_snapshot::SnapshotError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the control server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The ingest request failed authentication.
    #[error("unauthorized")]
    Unauthorized(#[from] AuthRejection),

    /// Invalid request content or parameters.
    #[error("{0}")]
    InvalidRequest(String),

    /// The request body exceeds the configured limit.
    #[error("payload too large")]
    PayloadTooLarge,

    /// Nothing is served at the requested key or path.
    #[error("{0}")]
    NotFound(String),

    /// The snapshot store could not complete the operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SnapshotError> for ServerError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Validation { message } => Self::InvalidRequest(message),
            SnapshotError::NotFound { kind, .. } => Self::NotFound(format!("{kind} report not found")),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl ServerError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::InvalidRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge => 413,
            Self::Storage(_) => 503,
            Self::Config(_) | Self::Internal(_) | Self::Io(_) => 500,
        }
    }

    /// Returns the auth reason code, if this is an auth failure.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized(rejection) => Some(rejection.reason()),
            _ => None,
        }
    }

    /// Returns the message sent to the caller.
    ///
    /// Storage and internal failures are not described to clients.
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage(_) => "storage unavailable".into(),
            Self::Config(_) | Self::Internal(_) | Self::Io(_) => "internal error".into(),
            other => other.to_string(),
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_)
                | Self::InvalidRequest(_)
                | Self::NotFound(_)
                | Self::PayloadTooLarge
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}
