//! In-process scenario tests for gsw-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot`; no network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use gsw_daemon::{api_types::LIVENESS_TEXT, routes, state};
use http_body_util::BodyExt;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn call(router: axum::Router, uri: &str) -> (StatusCode, bytes::Bytes) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let router = routes::build_router(Arc::new(state::AppState::new()));
    let (status, body) = call(router, "/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "gsw-daemon");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn root_is_plain_liveness_text() {
    let router = routes::build_router(Arc::new(state::AppState::new()));
    let (status, body) = call(router, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::str::from_utf8(&body).unwrap(), LIVENESS_TEXT);
}

#[tokio::test]
async fn status_starts_idle() {
    let router = routes::build_router(Arc::new(state::AppState::new()));
    let (status, body) = call(router, "/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["last_outcome"], "idle");
    assert_eq!(json["ticks_total"], 0);
    assert!(json["provenance"].is_null());
    assert!(json["published_message_id"].is_null());
}

#[tokio::test]
async fn status_reflects_written_snapshot() {
    let st = Arc::new(state::AppState::new());
    {
        let mut s = st.status.write().await;
        s.last_outcome = "changed".into();
        s.provenance = Some(gsw_schemas::Provenance::Fallback);
        s.seed_count = 2;
        s.last_updated_at = Some(Utc.with_ymd_and_hms(2026, 6, 10, 12, 0, 0).unwrap());
        s.published_message_id = Some("msg-1".into());
        s.ticks_total = 3;
    }

    let (_, body) = call(routes::build_router(st), "/v1/status").await;
    let json = parse_json(body);

    assert_eq!(json["last_outcome"], "changed");
    assert_eq!(json["provenance"], "backup");
    assert_eq!(json["seed_count"], 2);
    assert_eq!(json["published_message_id"], "msg-1");
    assert_eq!(json["ticks_total"], 3);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let router = routes::build_router(Arc::new(state::AppState::new()));
    let (status, _) = call(router, "/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
