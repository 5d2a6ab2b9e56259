//! Main control server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use vvtv_snapshot::{SnapshotStore, StoreOptions};

/// The control server.
///
/// Owns the snapshot store and serves the control plane routes over it.
///
/// # Example
///
/// ```
/// use vvtv_control_server::{ControlServer, ServerConfig};
///
/// let server = ControlServer::new(ServerConfig::default()).unwrap();
/// let app = server.router();
/// // Serve `app` with axum, or call `server.serve(shutdown).await`.
/// # drop(app);
/// ```
pub struct ControlServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl ControlServer {
    /// Creates a server, opening the store the configuration names.
    ///
    /// With no `data_dir` snapshots live in memory and are lost on exit.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if [`ServerConfig::validate`] rejects
    /// `config`, or a storage error if the snapshot log cannot be opened.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = match &config.data_dir {
            Some(dir) => SnapshotStore::open_dir(
                dir,
                StoreOptions {
                    durable_writes: config.durable_writes,
                },
            )?,
            None => SnapshotStore::open_in_memory()?,
        };
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Creates a server over an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<SnapshotStore>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Returns the snapshot store.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.context.store
    }

    /// Returns the transport-agnostic request handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Builds the HTTP router.
    pub fn router(&self) -> Router {
        crate::http::router(self.handler.clone())
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if binding or accepting fails.
    pub async fn serve<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.context.config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// In-flight requests are allowed to finish before this returns.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if accepting fails.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let config = &self.context.config;
        tracing::info!(
            addr = %addr,
            environment = %config.environment,
            persistent = config.data_dir.is_some(),
            max_body_bytes = config.max_body_bytes,
            "control server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("control server stopped");
        Ok(())
    }
}
