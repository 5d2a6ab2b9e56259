//! # vvtv Control Server
//!
//! HTTP control plane for vvtv.
//!
//! This crate provides:
//! - Public read endpoints for the pipeline status and daily/weekly reports
//! - Signed ingest endpoints for the single control publisher
//! - Server configuration with dev/production credential rules
//!
//! # Architecture
//!
//! [`RequestHandler`] holds the request semantics and knows nothing about
//! HTTP. The axum router in this crate extracts the method, the path as
//! received, the three auth headers and the raw body, and runs the handler
//! on a blocking thread since the snapshot store does file I/O.
//!
//! # Authentication
//!
//! Reads are public. Ingest requests must pass the
//! [`AuthGate`](vvtv_auth::AuthGate): bearer token, then timestamp and
//! signature presence, timestamp validity, freshness, and finally the
//! HMAC signature. Failures answer 401 with the reason code:
//!
//! ```json
//! {"error":"unauthorized","reason":"stale_timestamp"}
//! ```
//!
//! ```rust,no_run
//! use vvtv_control_server::{ControlServer, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let server = ControlServer::new(config)?;
//! server
//!     .serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod http;
mod server;

pub use config::{
    resolve_credential, ConfigError, Environment, ServerConfig, DEFAULT_MAX_BODY_BYTES,
    DEV_CONTROL_SECRET, DEV_CONTROL_TOKEN,
};
pub use error::{ServerError, ServerResult};
pub use handler::{
    ingest_kind, normalize_path, HandlerContext, IngestReceipt, RequestHandler, ROUTE_PREFIX,
};
pub use http::router;
pub use server::ControlServer;
