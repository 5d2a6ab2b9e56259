//! Server configuration.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use vvtv_auth::{ControlCredential, REPLAY_WINDOW_SECS};

/// Bearer token accepted in development when none is configured.
pub const DEV_CONTROL_TOKEN: &str = "dev-token";
/// Signing secret accepted in development when none is configured.
pub const DEV_CONTROL_SECRET: &str = "dev-secret";

/// Default request body limit for ingest (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development; missing credentials fall back to dev values.
    #[default]
    Dev,
    /// Anything else; real credentials are mandatory.
    Production,
}

impl Environment {
    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    /// Only `dev` (any case) selects [`Environment::Dev`]; every other
    /// name is treated as a production deployment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("dev") {
            Ok(Self::Dev)
        } else {
            Ok(Self::Production)
        }
    }
}

/// Errors raised while assembling the server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required credential is not set.
    #[error("{name} must be set outside dev")]
    MissingCredential {
        /// Variable name.
        name: &'static str,
    },

    /// A credential is set to the empty string.
    #[error("{name} must not be empty")]
    EmptyCredential {
        /// Variable name.
        name: &'static str,
    },

    /// A development default was supplied outside dev.
    #[error("{name} uses the dev default outside dev")]
    DevCredential {
        /// Variable name.
        name: &'static str,
    },

    /// A setting could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value supplied.
        value: String,
    },
}

/// Resolves the control credential for `environment`.
///
/// In [`Environment::Dev`] a missing token or secret falls back to the
/// dev defaults. Anywhere else both must be set and must differ from the
/// dev defaults. An empty value is always rejected.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found, token before secret.
pub fn resolve_credential(
    environment: Environment,
    token: Option<String>,
    secret: Option<String>,
) -> Result<ControlCredential, ConfigError> {
    let token = resolve_value(environment, "VVTV_CONTROL_TOKEN", token, DEV_CONTROL_TOKEN)?;
    let secret = resolve_value(environment, "VVTV_CONTROL_SECRET", secret, DEV_CONTROL_SECRET)?;
    Ok(ControlCredential::new(token, secret.into_bytes()))
}

fn resolve_value(
    environment: Environment,
    name: &'static str,
    value: Option<String>,
    dev_default: &str,
) -> Result<String, ConfigError> {
    match (environment, value) {
        (_, Some(v)) if v.is_empty() => Err(ConfigError::EmptyCredential { name }),
        (Environment::Dev, Some(v)) => Ok(v),
        (Environment::Dev, None) => Ok(dev_default.to_string()),
        (Environment::Production, Some(v)) if v == dev_default => {
            Err(ConfigError::DevCredential { name })
        }
        (Environment::Production, Some(v)) => Ok(v),
        (Environment::Production, None) => Err(ConfigError::MissingCredential { name }),
    }
}

/// Configuration for the control server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Directory holding the snapshot log; `None` keeps snapshots in memory.
    pub data_dir: Option<PathBuf>,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Whether every upsert is synced to disk before it is acknowledged.
    pub durable_writes: bool,
    /// Deployment environment.
    pub environment: Environment,
    /// Token and secret for ingest requests.
    pub credential: ControlCredential,
}

impl ServerConfig {
    /// Creates a configuration bound to `bind_addr` with the given credential.
    pub fn new(bind_addr: SocketAddr, credential: ControlCredential) -> Self {
        Self {
            bind_addr,
            data_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            durable_writes: true,
            environment: Environment::Dev,
            credential,
        }
    }

    /// Persists snapshots under `dir`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the request body limit.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Sets whether upserts are synced before acknowledging.
    pub fn with_durable_writes(mut self, durable: bool) -> Self {
        self.durable_writes = durable;
        self
    }

    /// Sets the deployment environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Replaces the control credential.
    pub fn with_credential(mut self, credential: ControlCredential) -> Self {
        self.credential = credential;
        self
    }

    /// Returns the accepted clock skew for signed requests, in seconds.
    pub fn replay_window_secs(&self) -> u64 {
        REPLAY_WINDOW_SECS
    }

    /// Builds a configuration from `VVTV_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from a variable lookup.
    ///
    /// Reads `VVTV_BIND_ADDR`, `VVTV_DATA_DIR`, `VVTV_ENV`,
    /// `VVTV_CONTROL_TOKEN`, `VVTV_CONTROL_SECRET` and
    /// `VVTV_MAX_BODY_BYTES`. Unset variables keep their defaults; an
    /// unset `VVTV_ENV` means dev.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparsable values or credentials
    /// that [`resolve_credential`] refuses.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("VVTV_ENV") {
            Some(raw) => raw.parse().unwrap_or(Environment::Production),
            None => Environment::Dev,
        };
        let credential = resolve_credential(
            environment,
            lookup("VVTV_CONTROL_TOKEN"),
            lookup("VVTV_CONTROL_SECRET"),
        )?;

        let mut config = Self::default()
            .with_environment(environment)
            .with_credential(credential);

        if let Some(raw) = lookup("VVTV_BIND_ADDR") {
            config.bind_addr = raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "VVTV_BIND_ADDR",
                value: raw.clone(),
            })?;
        }
        if let Some(dir) = lookup("VVTV_DATA_DIR").filter(|d| !d.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup("VVTV_MAX_BODY_BYTES") {
            config.max_body_bytes = raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "VVTV_MAX_BODY_BYTES",
                value: raw.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks settings that cannot be enforced by the builder.
    ///
    /// # Errors
    ///
    /// Rejects an empty credential, a zero body limit, and dev
    /// credentials outside [`Environment::Dev`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                name: "VVTV_MAX_BODY_BYTES",
                value: "0".into(),
            });
        }
        resolve_credential(
            self.environment,
            Some(self.credential.token().to_string()),
            Some(String::from_utf8_lossy(self.credential.secret()).into_owned()),
        )
        .map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(
            SocketAddr::from(([127, 0, 0, 1], 7070)),
            ControlCredential::new(DEV_CONTROL_TOKEN, DEV_CONTROL_SECRET.as_bytes().to_vec()),
        )
    }
}
