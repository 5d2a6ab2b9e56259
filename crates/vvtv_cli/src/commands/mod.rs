//! CLI command implementations.

pub mod compact;
pub mod inspect;
pub mod serve;
pub mod sign;

use crate::CredentialArgs;
use vvtv_auth::ControlCredential;
use vvtv_control_server::{resolve_credential, ConfigError};

impl CredentialArgs {
    /// Resolves the credential under the dev/production rules.
    pub fn resolve(self) -> Result<ControlCredential, ConfigError> {
        resolve_credential(self.environment, self.token, self.secret)
    }
}
