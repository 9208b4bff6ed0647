//! Integration tests for the feed API endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt`
//! without starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use citizen_cycle_server::router::build_router;
use citizen_cycle_server::state::AppState;
use citizen_cycle_types::WorldId;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn make_test_state() -> Arc<AppState> {
    let state = Arc::new(AppState::new());
    state
        .report(WorldId::new(302), true, Some("Zezima"), Some(1_000), 1_000)
        .await;
    state
        .report(WorldId::new(330), false, Some("Lynx Titan"), Some(2_000), 2_000)
        .await;
    state
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_list_citizens() {
    let router = build_router(make_test_state().await);

    let response = router
        .oneshot(Request::get("/api/citizens").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["world"], 302);
    assert_eq!(records[0]["distracted"], true);
    assert_eq!(records[0]["distractionStartTime"], 1_000);
    assert_eq!(records[1]["reportedBy"], "Lynx Titan");
}

#[tokio::test]
async fn test_list_citizens_empty() {
    let router = build_router(Arc::new(AppState::new()));

    let response = router
        .oneshot(Request::get("/api/citizens").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_get_citizen() {
    let router = build_router(make_test_state().await);

    let response = router
        .oneshot(Request::get("/api/citizens/330").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["world"], 330);
    assert_eq!(json["distracted"], false);
}

#[tokio::test]
async fn test_get_citizen_not_found() {
    let router = build_router(make_test_state().await);

    let response = router
        .oneshot(Request::get("/api/citizens/999").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "No data for this world");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_get_citizen_bad_id() {
    let router = build_router(make_test_state().await);

    let response = router
        .oneshot(Request::get("/api/citizens/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_starts_and_ends_distraction() {
    let state = Arc::new(AppState::new());

    let response = build_router(Arc::clone(&state))
        .oneshot(post_json(
            "/api/citizens",
            &json!({"playerName": "Zezima", "world": 420, "distracted": true, "timestamp": 5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["world"], 420);
    assert_eq!(json["data"]["lastUpdateTime"], 5);
    assert_eq!(json["data"]["distractionEndTime"], 0);
    assert!(json["data"]["distractionStartTime"].as_i64().unwrap() > 0);

    let response = build_router(Arc::clone(&state))
        .oneshot(post_json(
            "/api/citizens",
            &json!({"world": 420, "distracted": false}),
        ))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["data"]["distractionStartTime"], 0);
    assert!(json["data"]["distractionEndTime"].as_i64().unwrap() > 0);
    assert_eq!(json["data"]["reportedBy"], "Unknown");

    let stored = state.get(WorldId::new(420)).await.unwrap();
    assert!(!stored.distracted);
}

#[tokio::test]
async fn test_report_missing_fields() {
    let router = build_router(Arc::new(AppState::new()));

    let response = router
        .oneshot(post_json("/api/citizens", &json!({"world": 302})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Missing required fields: world, distracted");
}

#[tokio::test]
async fn test_report_malformed_body() {
    let router = build_router(Arc::new(AppState::new()));

    let response = router
        .oneshot(
            Request::post("/api/citizens")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_delete_citizen() {
    let state = make_test_state().await;

    let response = build_router(Arc::clone(&state))
        .oneshot(
            Request::delete("/api/citizens/302")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["message"], "Removed data for world 302");

    let response = build_router(state)
        .oneshot(
            Request::delete("/api/citizens/302")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let router = build_router(make_test_state().await);

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["worldsTracked"], 2);
    assert!(json["uptime"].is_u64());
}

#[tokio::test]
async fn test_stats() {
    let router = build_router(make_test_state().await);

    let response = router
        .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["totalWorlds"], 2);
    assert_eq!(json["distractedWorlds"], 1);
    assert_eq!(json["notDistractedWorlds"], 1);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let router = build_router(make_test_state().await);

    let response = router
        .oneshot(
            Request::get("/api/citizens")
                .header("origin", "https://example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
