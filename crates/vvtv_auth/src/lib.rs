//! # vvtv Auth
//!
//! Request authentication for the vvtv control plane ingest endpoints.
//!
//! A mutating request is authorized only when it carries:
//! - `authorization: Bearer <token>` matching the configured control token
//! - `x-vvtv-ts: <unix seconds>` within [`REPLAY_WINDOW_SECS`] of server time
//! - `x-vvtv-signature: <hex>` equal to HMAC-SHA256 over the canonical string
//!
//! The canonical string is
//!
//! ```text
//! METHOD \n PATH \n TIMESTAMP \n BODY
//! ```
//!
//! built from the exact bytes received. Nothing is normalized: a trailing
//! slash, a different case or a re-serialized body all change the digest.
//!
//! ```rust
//! use vvtv_auth::{sign_request, AuthGate, ControlCredential, SignedRequest};
//!
//! let credential = ControlCredential::new("token", b"secret".to_vec());
//! let body = br#"{"state":"RUNNING"}"#;
//! let headers = sign_request(&credential, "POST", "/v1/ingest/status", "1700000000", body);
//!
//! let gate = AuthGate::new(&credential);
//! let request = SignedRequest {
//!     method: "POST",
//!     path: "/v1/ingest/status",
//!     body,
//!     authorization: Some(&headers.authorization),
//!     timestamp: Some(&headers.timestamp),
//!     signature: Some(&headers.signature),
//! };
//! assert!(gate.authorize(&request, 1_700_000_100).is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod canonical;
mod credential;
mod digest;
mod error;
mod gate;
mod replay;

pub use canonical::canonical_string;
pub use credential::ControlCredential;
pub use digest::{compute_digest, sign_request, verify, SignatureHeaders, DIGEST_HEX_LEN};
pub use error::{AuthRejection, AuthResult};
pub use gate::{unix_now, AuthGate, ControlAccess, SignedRequest};
pub use replay::{parse_timestamp, ReplayGuard, REPLAY_WINDOW_SECS};

/// Header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "authorization";
/// Header carrying the signing timestamp in unix seconds.
pub const TIMESTAMP_HEADER: &str = "x-vvtv-ts";
/// Header carrying the lowercase hex signature.
pub const SIGNATURE_HEADER: &str = "x-vvtv-signature";
