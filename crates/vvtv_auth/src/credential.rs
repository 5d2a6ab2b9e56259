//! The control caller credential.

use std::fmt;
use zeroize::Zeroizing;

/// Token and signing secret shared with the single trusted publisher.
///
/// Built once at startup and passed by reference to the [`AuthGate`];
/// nothing mutates it afterwards. Both values are wiped from memory on
/// drop and are redacted from `Debug` output.
///
/// [`AuthGate`]: crate::AuthGate
#[derive(Clone)]
pub struct ControlCredential {
    token: Zeroizing<String>,
    secret: Zeroizing<Vec<u8>>,
}

impl ControlCredential {
    /// Creates a credential from a bearer token and an HMAC secret.
    pub fn new(token: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the HMAC secret.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for ControlCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlCredential")
            .field("token", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}
