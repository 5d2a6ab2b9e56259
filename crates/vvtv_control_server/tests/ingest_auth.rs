//! Signed ingest over HTTP: acceptance, every rejection reason, and the
//! order in which they are reported.

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vvtv_control_server::{ControlServer, ServerConfig};
use vvtv_snapshot::{SnapshotKind, SnapshotStore, StoreOptions};
use vvtv_testkit::{
    body_bytes, body_json, daily_payload, get_request, status_payload, test_credential,
    weekly_payload, FaultyBackend, SignedRequestBuilder,
};

fn app_with(config: ServerConfig) -> (Router, Arc<SnapshotStore>) {
    let store = Arc::new(SnapshotStore::open_in_memory().unwrap());
    let server = ControlServer::with_store(config.with_credential(test_credential()), Arc::clone(&store));
    (server.router(), store)
}

fn app() -> (Router, Arc<SnapshotStore>) {
    app_with(ServerConfig::default())
}

async fn send(app: &Router, request: SignedRequestBuilder) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request.build()).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

fn rejected(reason: &str) -> Value {
    json!({"error": "unauthorized", "reason": reason})
}

#[tokio::test]
async fn status_ingest_then_read() {
    let (app, _) = app();
    let payload = status_payload("RUNNING", 30);

    let (status, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/status").body(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "kind": "status"}));

    let response = app.oneshot(get_request("/v1/status")).await.unwrap();
    assert_eq!(body_bytes(response).await, payload);
}

#[tokio::test]
async fn daily_and_weekly_ingest_are_idempotent() {
    let (app, store) = app();
    let daily = daily_payload("2024-06-01", 4);
    let weekly = weekly_payload("2024-W22", 28);

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            SignedRequestBuilder::post("/v1/ingest/daily").body(daily.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "kind": "daily"}));

        let (status, body) = send(
            &app,
            SignedRequestBuilder::post("/v1/ingest/weekly").body(weekly.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "kind": "weekly"}));
    }

    assert_eq!(store.keys(SnapshotKind::Daily), vec!["2024-06-01"]);
    assert_eq!(store.keys(SnapshotKind::Weekly), vec!["2024-W22"]);
    assert_eq!(store.get_daily("2024-06-01").unwrap().payload.as_bytes(), daily);
}

#[tokio::test]
async fn later_ingest_replaces_earlier() {
    let (app, store) = app();
    for plays in [1, 2, 3] {
        let (status, _) = send(
            &app,
            SignedRequestBuilder::post("/v1/ingest/daily").body(daily_payload("2024-06-02", plays)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(
        store.get_daily("2024-06-02").unwrap().payload.as_bytes(),
        daily_payload("2024-06-02", 3)
    );
}

#[tokio::test]
async fn prefixed_path_is_signed_as_received() {
    let (app, store) = app();
    let payload = daily_payload("2024-06-03", 1);

    let (status, _) = send(
        &app,
        SignedRequestBuilder::post("/vvtv/v1/ingest/daily").body(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.get_daily("2024-06-03").is_ok());

    let (status, body) = send(
        &app,
        SignedRequestBuilder::post("/vvtv/v1/ingest/daily")
            .body(payload)
            .sign_path("/v1/ingest/daily"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, rejected("invalid_signature"));
}

#[tokio::test]
async fn invalid_token() {
    let (app, store) = app();
    let base = || SignedRequestBuilder::post("/v1/ingest/status").body(status_payload("X", 1));

    for request in [
        base().without_token(),
        base().token("nope"),
        base().token(""),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, rejected("invalid_token"));
    }
    assert!(store.get_status().is_none());
}

#[tokio::test]
async fn missing_signature_headers() {
    let (app, _) = app();
    let base = || SignedRequestBuilder::post("/v1/ingest/status").body(status_payload("X", 1));

    for request in [
        base().without_timestamp(),
        base().without_signature(),
        base().timestamp(""),
        base().signature(""),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, rejected("missing_signature_headers"));
    }
}

#[tokio::test]
async fn invalid_timestamp() {
    let (app, _) = app();
    for ts in ["abc", "NaN", "inf", "12:00"] {
        let (status, body) = send(
            &app,
            SignedRequestBuilder::post("/v1/ingest/status")
                .body(status_payload("X", 1))
                .timestamp(ts),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{ts}");
        assert_eq!(body, rejected("invalid_timestamp"), "{ts}");
    }
}

#[tokio::test]
async fn stale_timestamp() {
    let (app, _) = app();
    for offset in [-400, -301, 302, 3600] {
        let (status, body) = send(
            &app,
            SignedRequestBuilder::post("/v1/ingest/status")
                .body(status_payload("X", 1))
                .timestamp_offset(offset),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{offset}");
        assert_eq!(body, rejected("stale_timestamp"), "{offset}");
    }
}

#[tokio::test]
async fn timestamps_inside_window_accepted() {
    let (app, _) = app();
    for offset in [-299, -5, 0, 5, 299] {
        let (status, _) = send(
            &app,
            SignedRequestBuilder::post("/v1/ingest/status")
                .body(status_payload("X", 1))
                .timestamp_offset(offset),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{offset}");
    }
}

#[tokio::test]
async fn invalid_signature() {
    let (app, store) = app();
    let payload = status_payload("X", 1);
    let base = || SignedRequestBuilder::post("/v1/ingest/status").body(payload.clone());

    for request in [
        base().secret(b"other-secret".to_vec()),
        base().sign_body(status_payload("Y", 1)),
        base().sign_path("/v1/ingest/status/"),
        base().signature("00".repeat(32)),
        base().signature("not hex"),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, rejected("invalid_signature"));
    }
    assert!(store.get_status().is_none());
}

#[tokio::test]
async fn uppercase_signature_rejected() {
    let (app, _) = app();
    let builder = SignedRequestBuilder::post("/v1/ingest/status").body(status_payload("X", 1));
    let upper = builder.computed_signature().unwrap().to_uppercase();

    let (status, body) = send(&app, builder.signature(upper)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, rejected("invalid_signature"));
}

#[tokio::test]
async fn token_checked_before_everything_else() {
    let (app, _) = app();
    let (_, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/status")
            .token("wrong")
            .timestamp("garbage")
            .without_signature(),
    )
    .await;
    assert_eq!(body, rejected("invalid_token"));

    let (_, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/status")
            .timestamp("garbage")
            .without_signature(),
    )
    .await;
    assert_eq!(body, rejected("missing_signature_headers"));

    let (_, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/status")
            .timestamp("garbage")
            .secret(b"other".to_vec()),
    )
    .await;
    assert_eq!(body, rejected("invalid_timestamp"));

    let (_, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/status")
            .timestamp_offset(-1000)
            .secret(b"other".to_vec()),
    )
    .await;
    assert_eq!(body, rejected("stale_timestamp"));
}

#[tokio::test]
async fn unsupported_ingest_endpoint_after_auth() {
    let (app, _) = app();

    let (status, body) = send(&app, SignedRequestBuilder::post("/v1/ingest/monthly").body(b"{}".to_vec())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "unsupported ingest endpoint"}));

    let (status, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/monthly").without_token(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, rejected("invalid_token"));
}

#[tokio::test]
async fn bare_ingest_prefix_runs_auth_first() {
    let (app, store) = app();

    for path in ["/v1/ingest/", "/vvtv/v1/ingest/"] {
        let (status, body) = send(&app, SignedRequestBuilder::post(path).without_token()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body, rejected("invalid_token"), "{path}");

        let (status, body) = send(&app, SignedRequestBuilder::post(path).body(b"{}".to_vec())).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body, json!({"error": "unsupported ingest endpoint"}), "{path}");
    }
    assert_eq!(store.stats().unwrap().log_records, 0);
}

#[tokio::test]
async fn validation_errors_leave_store_untouched() {
    let (app, store) = app();
    store
        .upsert_daily("2024-06-04", &daily_payload("2024-06-04", 1))
        .unwrap();
    let before = store.stats().unwrap();

    for (path, payload, message) in [
        ("/v1/ingest/daily", &br#"{"plays":1}"#[..], "daily report missing date"),
        ("/v1/ingest/daily", &br#"{"date":""}"#[..], "daily report missing date"),
        ("/v1/ingest/daily", &br#"{"date":7}"#[..], "daily report missing date"),
        ("/v1/ingest/weekly", &br#"{"date":"2024-06-04"}"#[..], "weekly report missing week"),
    ] {
        let (status, body) = send(&app, SignedRequestBuilder::post(path).body(payload.to_vec())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body, json!({"error": message}), "{path}");
    }

    for payload in [
        &b"not json"[..],
        &b"[1,2]"[..],
        &b""[..],
        &br#"{"date":"2024-06-04""#[..],
    ] {
        let (status, body) = send(
            &app,
            SignedRequestBuilder::post("/v1/ingest/daily").body(payload.to_vec()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("daily payload is not a JSON object"));
    }

    assert_eq!(store.stats().unwrap(), before);
    assert_eq!(
        store.get_daily("2024-06-04").unwrap().payload.as_bytes(),
        daily_payload("2024-06-04", 1)
    );
}

#[tokio::test]
async fn oversized_body_rejected_before_auth() {
    let (app, store) = app_with(ServerConfig::default().with_max_body_bytes(64));
    let mut payload = br#"{"date":"2024-06-05","pad":""#.to_vec();
    payload.extend(std::iter::repeat(b'x').take(128));
    payload.extend(br#""}"#);

    let (status, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/daily")
            .body(payload)
            .without_token(),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"error": "payload too large"}));
    assert!(store.keys(SnapshotKind::Daily).is_empty());
}

#[tokio::test]
async fn storage_failure_is_service_unavailable() {
    let (backend, switch) = FaultyBackend::new();
    let store = Arc::new(SnapshotStore::open(Box::new(backend), StoreOptions::default()).unwrap());
    let config = ServerConfig::default().with_credential(test_credential());
    let app = ControlServer::with_store(config, Arc::clone(&store)).router();

    switch.fail_writes();
    let (status, body) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/status").body(status_payload("X", 1)),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "storage unavailable"}));
    assert!(store.get_status().is_none());

    switch.heal();
    let (status, _) = send(
        &app,
        SignedRequestBuilder::post("/v1/ingest/status").body(status_payload("X", 1)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
