//! Authentication failure reasons.

use thiserror::Error;

/// Result type for authentication checks.
pub type AuthResult<T> = Result<T, AuthRejection>;

/// Why a mutating request was refused.
///
/// Every variant is surfaced to the caller as HTTP 401 together with the
/// [`reason`](Self::reason) code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthRejection {
    /// The bearer token is absent or does not match.
    #[error("unauthorized: invalid token")]
    InvalidToken,

    /// The timestamp or signature header is absent or empty.
    #[error("unauthorized: missing signature headers")]
    MissingSignatureHeaders,

    /// The timestamp is not a finite number.
    #[error("unauthorized: invalid timestamp")]
    InvalidTimestamp,

    /// The timestamp is outside the replay window.
    #[error("unauthorized: stale timestamp")]
    StaleTimestamp,

    /// The signature does not match the request.
    #[error("unauthorized: invalid signature")]
    InvalidSignature,
}

impl AuthRejection {
    /// Returns the machine-readable reason code.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid_token",
            Self::MissingSignatureHeaders => "missing_signature_headers",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::StaleTimestamp => "stale_timestamp",
            Self::InvalidSignature => "invalid_signature",
        }
    }
}
