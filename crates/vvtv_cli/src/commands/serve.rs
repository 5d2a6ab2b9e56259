//! Serve command implementation.

use crate::CredentialArgs;
use std::net::SocketAddr;
use std::path::PathBuf;
use vvtv_control_server::{ControlServer, ServerConfig};

/// Settings for the serve command besides the credential.
#[derive(Debug)]
pub struct ServeOptions {
    /// Address to listen on.
    pub bind: SocketAddr,
    /// Snapshot directory, if persistent.
    pub data_dir: Option<PathBuf>,
    /// Request body limit.
    pub max_body_bytes: usize,
    /// Sync every upsert to disk.
    pub durable_writes: bool,
}

/// Builds and validates the server configuration.
pub fn build_config(
    options: ServeOptions,
    credential: CredentialArgs,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let environment = credential.environment;
    let mut config = ServerConfig::new(options.bind, credential.resolve()?)
        .with_environment(environment)
        .with_max_body_bytes(options.max_body_bytes)
        .with_durable_writes(options.durable_writes);
    if let Some(dir) = options.data_dir {
        config = config.with_data_dir(dir);
    }
    config.validate()?;
    Ok(config)
}

/// Runs the serve command.
pub fn run(options: ServeOptions, credential: CredentialArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(options, credential)?;
    if config.data_dir.is_none() {
        tracing::warn!("no data directory configured, snapshots will be lost on exit");
    }

    let server = ControlServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for shutdown signal");
            return;
        }
        tracing::info!("shutdown requested");
    }))?;

    Ok(())
}
