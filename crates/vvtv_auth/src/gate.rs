//! The ingest authorization gate.

use crate::canonical::canonical_string;
use crate::credential::ControlCredential;
use crate::digest::{compute_digest, verify};
use crate::error::{AuthRejection, AuthResult};
use crate::replay::{parse_timestamp, ReplayGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

const BEARER_PREFIX: &str = "Bearer ";

/// The parts of an inbound mutating request the gate looks at.
///
/// Header fields are `None` when the header is absent. `path` and `body`
/// must be the exact bytes received.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Request path as received, without the query string.
    pub path: &'a str,
    /// Raw request body.
    pub body: &'a [u8],
    /// `authorization` header value.
    pub authorization: Option<&'a str>,
    /// `x-vvtv-ts` header value.
    pub timestamp: Option<&'a str>,
    /// `x-vvtv-signature` header value.
    pub signature: Option<&'a str>,
}

/// Proof that a request passed the gate.
///
/// Carries no identity: there is exactly one control caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlAccess {
    _private: (),
}

/// All-or-nothing authorization for ingest requests.
#[derive(Debug, Clone, Copy)]
pub struct AuthGate<'c> {
    credential: &'c ControlCredential,
    replay: ReplayGuard,
}

impl<'c> AuthGate<'c> {
    /// Creates a gate bound to the process credential.
    #[must_use]
    pub fn new(credential: &'c ControlCredential) -> Self {
        Self {
            credential,
            replay: ReplayGuard::new(),
        }
    }

    /// Authorizes a request against `now` (unix seconds).
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// 1. bearer token
    /// 2. presence of timestamp and signature headers
    /// 3. timestamp is a finite number
    /// 4. timestamp freshness
    /// 5. signature
    ///
    /// # Errors
    ///
    /// Returns the [`AuthRejection`] for the first failed check.
    pub fn authorize(&self, request: &SignedRequest<'_>, now: u64) -> AuthResult<ControlAccess> {
        if !self.token_matches(request.authorization) {
            return Err(AuthRejection::InvalidToken);
        }

        let (timestamp, signature) = match (
            request.timestamp.filter(|v| !v.is_empty()),
            request.signature.filter(|v| !v.is_empty()),
        ) {
            (Some(ts), Some(sig)) => (ts, sig),
            _ => return Err(AuthRejection::MissingSignatureHeaders),
        };

        let parsed = parse_timestamp(timestamp).ok_or(AuthRejection::InvalidTimestamp)?;
        if !self.replay.is_fresh_at(parsed, now) {
            return Err(AuthRejection::StaleTimestamp);
        }

        let canonical = canonical_string(request.method, request.path, timestamp, request.body);
        let expected = compute_digest(self.credential.secret(), &canonical);
        if !verify(&expected, signature) {
            return Err(AuthRejection::InvalidSignature);
        }

        Ok(ControlAccess { _private: () })
    }

    /// Authorizes a request against the current system clock.
    ///
    /// # Errors
    ///
    /// See [`authorize`](Self::authorize).
    pub fn authorize_now(&self, request: &SignedRequest<'_>) -> AuthResult<ControlAccess> {
        self.authorize(request, unix_now())
    }

    fn token_matches(&self, authorization: Option<&str>) -> bool {
        let Some(supplied) = authorization.and_then(|v| v.strip_prefix(BEARER_PREFIX)) else {
            return false;
        };
        supplied
            .as_bytes()
            .ct_eq(self.credential.token().as_bytes())
            .into()
    }
}

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
