//! HTTP routes.
//!
//! Every route is mounted twice, at the root and under `/vvtv`. Ingest
//! signatures are checked against the path exactly as the client sent it,
//! taken from [`OriginalUri`] so nesting does not alter it.

use crate::error::{ServerError, ServerResult};
use crate::handler::{IngestReceipt, RequestHandler, ROUTE_PREFIX};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, OriginalUri, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use vvtv_auth::{unix_now, SignedRequest, AUTHORIZATION_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Query pairs in request order; repeated names are kept.
type QueryPairs = Query<Vec<(String, String)>>;

/// First value of `name`, the way a browser's `URLSearchParams::get` reads it.
fn first_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Builds the control plane router over `handler`.
pub fn router(handler: RequestHandler) -> Router {
    let max_body_bytes = handler.context().config.max_body_bytes;

    let routes = Router::new()
        .route("/health", get(health))
        .route("/v1/status", get(get_status))
        .route("/v1/reports/daily", get(get_daily))
        .route("/v1/reports/weekly", get(get_weekly))
        .route("/v1/ingest/", post(post_ingest))
        .route("/v1/ingest/{*kind}", post(post_ingest));

    Router::new()
        .merge(routes.clone())
        .nest(ROUTE_PREFIX, routes)
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(handler)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match self.reason() {
            Some(reason) => json!({ "error": self.public_message(), "reason": reason }),
            None => json!({ "error": self.public_message() }),
        };
        (status, Json(body)).into_response()
    }
}

async fn run_blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

fn json_payload(payload: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn get_status(State(handler): State<RequestHandler>) -> ServerResult<Response> {
    let payload = run_blocking(move || Ok(handler.status())).await?;
    Ok(json_payload(payload))
}

async fn get_daily(
    State(handler): State<RequestHandler>,
    Query(pairs): QueryPairs,
) -> ServerResult<Response> {
    let payload = run_blocking(move || handler.daily_report(first_param(&pairs, "date"))).await?;
    Ok(json_payload(payload))
}

async fn get_weekly(
    State(handler): State<RequestHandler>,
    Query(pairs): QueryPairs,
) -> ServerResult<Response> {
    let payload = run_blocking(move || handler.weekly_report(first_param(&pairs, "week"))).await?;
    Ok(json_payload(payload))
}

async fn post_ingest(
    State(handler): State<RequestHandler>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<IngestReceipt>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::InvalidRequest(rejection.body_text())
        }
    })?;

    let path = uri.path().to_owned();
    let authorization = header_value(&headers, AUTHORIZATION_HEADER);
    let timestamp = header_value(&headers, TIMESTAMP_HEADER);
    let signature = header_value(&headers, SIGNATURE_HEADER);
    tracing::debug!(path = %path, bytes = body.len(), "ingest request");

    let log_path = path.clone();
    let now = unix_now();
    let result = run_blocking(move || {
        let request = SignedRequest {
            method: method.as_str(),
            path: &path,
            body: &body,
            authorization: authorization.as_deref(),
            timestamp: timestamp.as_deref(),
            signature: signature.as_deref(),
        };
        handler.handle_ingest(&request, now)
    })
    .await;

    match result {
        Ok(receipt) => Ok(Json(receipt)),
        Err(err) => {
            if let Some(reason) = err.reason() {
                tracing::warn!(path = %log_path, reason, "ingest rejected");
            }
            Err(err)
        }
    }
}

async fn not_found() -> ServerError {
    ServerError::NotFound("not found".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_param_takes_first_occurrence() {
        let pairs = vec![
            ("week".to_string(), "2024-W02".to_string()),
            ("date".to_string(), "2024-01-01".to_string()),
            ("date".to_string(), "2024-01-02".to_string()),
        ];
        assert_eq!(first_param(&pairs, "date"), Some("2024-01-01"));
        assert_eq!(first_param(&pairs, "week"), Some("2024-W02"));
        assert_eq!(first_param(&pairs, "month"), None);
    }
}
