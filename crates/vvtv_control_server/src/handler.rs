//! Request handlers for control endpoints.
//!
//! Everything here is synchronous and transport-agnostic; the HTTP layer
//! extracts the raw request parts and runs these on a blocking thread.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use serde::Serialize;
use std::sync::Arc;
use vvtv_auth::{AuthGate, ControlAccess, SignedRequest};
use vvtv_snapshot::{SnapshotKind, SnapshotStore, DEFAULT_STATUS_PAYLOAD};

/// Prefix under which every route is also served.
pub const ROUTE_PREFIX: &str = "/vvtv";

const INGEST_PREFIX: &str = "/v1/ingest/";

/// Strips the optional `/vvtv` prefix; `/vvtv` alone becomes `/`.
///
/// Only used for routing. The signature always covers the path as
/// received.
pub fn normalize_path(path: &str) -> &str {
    match path.strip_prefix(ROUTE_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Maps an ingest path to the kind it writes.
///
/// Returns `None` for paths under `/v1/ingest/` that name no kind.
pub fn ingest_kind(path: &str) -> Option<SnapshotKind> {
    normalize_path(path)
        .strip_prefix(INGEST_PREFIX)
        .and_then(SnapshotKind::from_name)
}

/// Acknowledgement returned for an accepted ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReceipt {
    /// Always true.
    pub ok: bool,
    /// Kind that was written.
    pub kind: &'static str,
}

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Snapshot store (shared across all handlers).
    pub store: Arc<SnapshotStore>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, store: Arc<SnapshotStore>) -> Self {
        Self { config, store }
    }
}

/// Handler for control requests.
#[derive(Clone)]
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Returns the shared context.
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Returns the current status payload, or the default when none has
    /// been ingested.
    pub fn status(&self) -> String {
        self.context
            .store
            .get_status()
            .map(|s| s.payload)
            .unwrap_or_else(|| DEFAULT_STATUS_PAYLOAD.to_string())
    }

    /// Returns the payload of the daily report for `date`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `date` is absent or empty, `NotFound` when
    /// nothing is stored for it.
    pub fn daily_report(&self, date: Option<&str>) -> ServerResult<String> {
        let date = date
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ServerError::InvalidRequest("missing date".into()))?;
        Ok(self.context.store.get_daily(date)?.payload)
    }

    /// Returns the payload of the weekly report for `week`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `week` is absent or empty, `NotFound` when
    /// nothing is stored for it.
    pub fn weekly_report(&self, week: Option<&str>) -> ServerResult<String> {
        let week = week
            .filter(|w| !w.is_empty())
            .ok_or_else(|| ServerError::InvalidRequest("missing week".into()))?;
        Ok(self.context.store.get_weekly(week)?.payload)
    }

    /// Runs the auth gate for `request` at `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// `Unauthorized` with the first failed check.
    pub fn authorize(&self, request: &SignedRequest<'_>, now: u64) -> ServerResult<ControlAccess> {
        Ok(AuthGate::new(&self.context.config.credential).authorize(request, now)?)
    }

    /// Authorizes and applies an ingest request.
    ///
    /// Authentication always runs first, so an unknown ingest path is only
    /// reported to an authorized caller.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, then `NotFound` for an unknown kind, then
    /// `InvalidRequest` for a malformed payload, then `Storage`.
    pub fn handle_ingest(&self, request: &SignedRequest<'_>, now: u64) -> ServerResult<IngestReceipt> {
        let access = self.authorize(request, now)?;
        self.ingest(access, request.path, request.body)
    }

    /// Applies an already authorized ingest.
    ///
    /// # Errors
    ///
    /// See [`handle_ingest`](Self::handle_ingest).
    pub fn ingest(&self, _access: ControlAccess, path: &str, body: &[u8]) -> ServerResult<IngestReceipt> {
        let kind = ingest_kind(path)
            .ok_or_else(|| ServerError::NotFound("unsupported ingest endpoint".into()))?;
        let snapshot = self.context.store.ingest(kind, body)?;

        tracing::info!(
            kind = %kind,
            key = %snapshot.key,
            bytes = body.len(),
            "ingest accepted"
        );

        Ok(IngestReceipt {
            ok: true,
            kind: kind.as_str(),
        })
    }
}
