//! Read-side routes, prefixes and fallbacks.

use axum::http::{header, StatusCode};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use vvtv_control_server::{ControlServer, ServerConfig};
use vvtv_snapshot::{SnapshotStore, DEFAULT_STATUS_PAYLOAD};
use vvtv_testkit::{body_bytes, body_json, daily_payload, get_request, test_credential, weekly_payload};

fn app() -> (Router, Arc<SnapshotStore>) {
    let store = Arc::new(SnapshotStore::open_in_memory().unwrap());
    let config = ServerConfig::default().with_credential(test_credential());
    let server = ControlServer::with_store(config, Arc::clone(&store));
    (server.router(), store)
}

#[tokio::test]
async fn health_reports_version() {
    let (app, _) = app();
    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn status_default_before_first_ingest() {
    let (app, _) = app();
    let response = app.oneshot(get_request("/v1/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_bytes(response).await, DEFAULT_STATUS_PAYLOAD.as_bytes());
}

#[tokio::test]
async fn status_served_verbatim() {
    let (app, store) = app();
    let raw = "{ \"state\": \"PAUSED\",\n \"buffer_minutes\": 12.50 }";
    store.upsert_status(raw.as_bytes()).unwrap();

    let response = app.oneshot(get_request("/v1/status")).await.unwrap();
    assert_eq!(body_bytes(response).await, raw.as_bytes());
}

#[tokio::test]
async fn every_route_served_under_prefix() {
    let (app, store) = app();
    store
        .upsert_daily("2024-05-01", &daily_payload("2024-05-01", 9))
        .unwrap();

    for uri in [
        "/vvtv/health",
        "/vvtv/v1/status",
        "/vvtv/v1/reports/daily?date=2024-05-01",
    ] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn daily_report_lookup() {
    let (app, store) = app();
    let payload = daily_payload("2024-05-01", 9);
    store.upsert_daily("2024-05-01", &payload).unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/v1/reports/daily?date=2024-05-01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, payload);

    let response = app
        .oneshot(get_request("/v1/reports/daily?date=2024-05-02"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "daily report not found"})
    );
}

#[tokio::test]
async fn weekly_report_lookup() {
    let (app, store) = app();
    let payload = weekly_payload("2024-W18", 40);
    store.upsert_weekly("2024-W18", &payload).unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/v1/reports/weekly?week=2024-W18"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, payload);

    let response = app
        .oneshot(get_request("/v1/reports/weekly?week=2024-W19"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "weekly report not found"})
    );
}

#[tokio::test]
async fn missing_query_parameter_is_bad_request() {
    let (app, _) = app();
    for (uri, message) in [
        ("/v1/reports/daily", "missing date"),
        ("/v1/reports/daily?date=", "missing date"),
        ("/v1/reports/daily?week=2024-W01", "missing date"),
        ("/v1/reports/weekly", "missing week"),
        ("/vvtv/v1/reports/weekly?week=", "missing week"),
    ] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await, json!({"error": message}), "{uri}");
    }
}

#[tokio::test]
async fn repeated_query_parameter_uses_first_value() {
    let (app, store) = app();
    store
        .upsert_daily("2024-01-01", &daily_payload("2024-01-01", 1))
        .unwrap();
    store
        .upsert_weekly("2024-W01", &weekly_payload("2024-W01", 7))
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/v1/reports/daily?date=2024-01-01&date=2024-01-02"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, daily_payload("2024-01-01", 1));

    let response = app
        .clone()
        .oneshot(get_request("/vvtv/v1/reports/weekly?week=2024-W09&week=2024-W01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "weekly report not found"})
    );

    let response = app
        .oneshot(get_request("/v1/reports/daily?date=&date=2024-01-01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_json(response).await, json!({"error": "missing date"}));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let (app, _) = app();
    for uri in ["/", "/vvtv", "/v2/status", "/v1/reports/monthly", "/vvtvx/v1/status"] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(response).await, json!({"error": "not found"}), "{uri}");
    }
}

#[tokio::test]
async fn wrong_method_is_not_found() {
    let (app, _) = app();
    let response = app
        .oneshot(get_request("/v1/ingest/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "not found"}));
}
