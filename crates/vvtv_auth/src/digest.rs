//! HMAC-SHA256 signing and verification.

use crate::canonical::canonical_string;
use crate::credential::ControlCredential;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Computes the lowercase hex HMAC-SHA256 of `canonical` under `secret`.
///
/// Always returns [`DIGEST_HEX_LEN`] characters.
#[must_use]
#[allow(clippy::expect_used)]
pub fn compute_digest(secret: &[u8], canonical: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(canonical);
    hex::encode(mac.finalize().into_bytes())
}

/// Compares an expected digest with a caller-supplied one.
///
/// Exact string equality evaluated in constant time for equal-length
/// inputs. Uppercase hex does not match.
#[must_use]
pub fn verify(expected_hex: &str, supplied_hex: &str) -> bool {
    expected_hex.as_bytes().ct_eq(supplied_hex.as_bytes()).into()
}

/// Header values a control caller attaches to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// `authorization` header value (`Bearer <token>`).
    pub authorization: String,
    /// `x-vvtv-ts` header value.
    pub timestamp: String,
    /// `x-vvtv-signature` header value.
    pub signature: String,
}

/// Signs a request the way the control publisher does.
///
/// `timestamp` is sent verbatim in `x-vvtv-ts` and is also the string
/// that gets signed.
#[must_use]
pub fn sign_request(
    credential: &ControlCredential,
    method: &str,
    path: &str,
    timestamp: &str,
    body: &[u8],
) -> SignatureHeaders {
    let canonical = canonical_string(method, path, timestamp, body);
    SignatureHeaders {
        authorization: format!("Bearer {}", credential.token()),
        timestamp: timestamp.to_string(),
        signature: compute_digest(credential.secret(), &canonical),
    }
}
