//! vvtv control CLI
//!
//! Command-line tools for the vvtv control plane.
//!
//! # Commands
//!
//! - `serve` - Run the control server until Ctrl-C
//! - `sign` - Print the auth headers for a request
//! - `inspect` - Display snapshot log statistics and keys
//! - `compact` - Rewrite the snapshot log keeping live records

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vvtv_control_server::Environment;

/// vvtv control plane tools.
#[derive(Parser)]
#[command(name = "vvtv-control")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Log output format
    #[arg(global = true, long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Deployment environment and control credential.
#[derive(Debug, Args)]
pub struct CredentialArgs {
    /// Deployment environment; anything but `dev` requires real credentials
    #[arg(long = "env", env = "VVTV_ENV", default_value = "dev")]
    pub environment: Environment,

    /// Bearer token for ingest
    #[arg(long, env = "VVTV_CONTROL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// HMAC signing secret for ingest
    #[arg(long, env = "VVTV_CONTROL_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "VVTV_BIND_ADDR", default_value = "127.0.0.1:7070")]
        bind: SocketAddr,

        /// Snapshot directory; snapshots are kept in memory when omitted
        #[arg(short, long, env = "VVTV_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Largest accepted request body in bytes
        #[arg(long, env = "VVTV_MAX_BODY_BYTES", default_value_t = vvtv_control_server::DEFAULT_MAX_BODY_BYTES)]
        max_body_bytes: usize,

        /// Flush without fsync on every ingest
        #[arg(long)]
        no_sync: bool,

        #[command(flatten)]
        credential: CredentialArgs,
    },

    /// Print the auth headers for a request
    Sign {
        /// HTTP method
        #[arg(short, long, default_value = "POST")]
        method: String,

        /// Request path exactly as it will be sent
        #[arg(short, long)]
        path: String,

        /// Request body
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the request body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Unix timestamp to sign with (defaults to now)
        #[arg(short, long)]
        timestamp: Option<String>,

        #[command(flatten)]
        credential: CredentialArgs,
    },

    /// Display snapshot log statistics and keys
    Inspect {
        /// Snapshot directory
        #[arg(short, long, env = "VVTV_DATA_DIR")]
        data_dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Rewrite the snapshot log keeping only live records
    Compact {
        /// Snapshot directory
        #[arg(short, long, env = "VVTV_DATA_DIR")]
        data_dir: PathBuf,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn init_logging(verbose: bool, format: LogFormat) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match cli.command {
        Commands::Serve {
            bind,
            data_dir,
            max_body_bytes,
            no_sync,
            credential,
        } => {
            let options = commands::serve::ServeOptions {
                bind,
                data_dir,
                max_body_bytes,
                durable_writes: !no_sync,
            };
            commands::serve::run(options, credential)?;
        }
        Commands::Sign {
            method,
            path,
            body,
            body_file,
            timestamp,
            credential,
        } => {
            let body = match (body, body_file) {
                (Some(body), _) => body.into_bytes(),
                (None, Some(file)) => std::fs::read(file)?,
                (None, None) => Vec::new(),
            };
            commands::sign::run(&method, &path, &body, timestamp, credential)?;
        }
        Commands::Inspect { data_dir, format } => {
            commands::inspect::run(&data_dir, format)?;
        }
        Commands::Compact { data_dir, dry_run } => {
            commands::compact::run(&data_dir, dry_run)?;
        }
        Commands::Version => {
            println!("vvtv-control v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
