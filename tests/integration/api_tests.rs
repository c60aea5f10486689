//! API integration tests for the root, tile and health endpoints.
//!
//! Tests verify:
//! - The tile URL template for returned map ids, with and without token
//! - Error cases (missing map id, failing Earth Engine calls, failed startup)
//! - The root endpoint regardless of engine health

use std::sync::atomic::Ordering;

use axum::http::StatusCode;

use gee_tiles::engine::{initialize_engine, MapDescriptor, Readiness};
use gee_tiles::error::EngineError;

use super::test_utils::{body_json, get_request, router_with, MockEngine};

// =============================================================================
// Root Endpoint
// =============================================================================

#[tokio::test]
async fn test_root_returns_welcome() {
    let router = router_with(MockEngine::new(), Readiness::Ready);

    let response = get_request(router, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({ "message": "Welcome to the GEE Tile Service!" }));
}

#[tokio::test]
async fn test_root_served_after_failed_initialization() {
    let engine = MockEngine::unreachable();
    let readiness = initialize_engine(&engine, "test-project").await;
    assert!(!readiness.is_ready());

    let router = router_with(engine, readiness);
    let response = get_request(router, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Welcome to the GEE Tile Service!");
}

// =============================================================================
// Tile Endpoint
// =============================================================================

#[tokio::test]
async fn test_gee_tiles_success_without_token() {
    let engine = MockEngine::new().with_map_descriptor(MapDescriptor::new("abc123", ""));
    let router = router_with(engine, Readiness::Ready);

    let response = get_request(router, "/gee-tiles").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let json = body_json(response).await;
    assert_eq!(
        json["tile_url"],
        "https://earthengine.googleapis.com/v1/abc123/tiles/{z}/{x}/{y}"
    );
    assert_eq!(json["map_info"]["mapid"], "abc123");
    assert_eq!(json["map_info"]["token"], "");
}

#[tokio::test]
async fn test_gee_tiles_success_with_token() {
    let engine = MockEngine::new().with_map_descriptor(MapDescriptor::new("abc123", "secret-token"));
    let router = router_with(engine, Readiness::Ready);

    let response = get_request(router, "/gee-tiles").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["tile_url"],
        "https://earthengine.googleapis.com/v1/abc123/tiles/{z}/{x}/{y}"
    );
    assert_eq!(json["map_info"]["token"], "secret-token");
}

#[tokio::test]
async fn test_gee_tiles_empty_mapid() {
    let engine = MockEngine::new().with_map_descriptor(MapDescriptor::new("", "tok"));
    let router = router_with(engine, Readiness::Ready);

    let response = get_request(router, "/gee-tiles").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.contains("Failed to generate GEE tiles"));
    assert!(detail.contains("No mapid returned from GEE"));
    assert!(json.get("map_info").is_none());
    assert!(json.get("tile_url").is_none());
}

#[tokio::test]
async fn test_gee_tiles_collection_load_error() {
    let engine = MockEngine::new().failing_map(EngineError::Api {
        status: 400,
        message: "ImageCollection.load: ImageCollection asset 'JAXA/ALOS/AW3D30/V4_1' not found."
            .to_string(),
    });
    let router = router_with(engine, Readiness::Ready);

    let response = get_request(router, "/gee-tiles").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("Failed to generate GEE tiles: "));
    assert!(detail.contains("not found"));
    assert!(json.get("map_info").is_none());

    // Only `detail` is exposed
    assert_eq!(json.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gee_tiles_transport_error() {
    let engine = MockEngine::new().failing_map(EngineError::Http(
        "error sending request: connection refused".to_string(),
    ));
    let router = router_with(engine, Readiness::Ready);

    let response = get_request(router, "/gee-tiles").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_gee_tiles_after_failed_initialization() {
    let engine = MockEngine::unreachable();
    let map_calls = engine.map_calls();
    let readiness = initialize_engine(&engine, "test-project").await;

    let router = router_with(engine, readiness);
    let response = get_request(router, "/gee-tiles").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.contains("Failed to generate GEE tiles"));
    assert!(detail.contains("could not find default credentials"));
    assert_eq!(map_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_each_request_asks_engine_again() {
    let engine = MockEngine::new();
    let map_calls = engine.map_calls();
    let router = router_with(engine, Readiness::Ready);

    for _ in 0..3 {
        let response = get_request(router.clone(), "/gee-tiles").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(map_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unknown_route() {
    let router = router_with(MockEngine::new(), Readiness::Ready);
    let response = get_request(router, "/tiles/0/0/0").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn test_probe_success_skips_adc() {
    let engine = MockEngine::new();
    let init_calls = engine.init_calls();

    let readiness = initialize_engine(&engine, "test-project").await;
    assert_eq!(readiness, Readiness::Ready);
    assert_eq!(init_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_probe_failure_falls_back_to_adc() {
    let engine = MockEngine::new().with_probe(Err(EngineError::NotInitialized));
    let init_calls = engine.init_calls();

    let readiness = initialize_engine(&engine, "test-project").await;
    assert_eq!(readiness, Readiness::Ready);
    assert_eq!(init_calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_ready() {
    let router = router_with(MockEngine::new(), Readiness::Ready);

    let response = get_request(router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json.get("reason").is_none());
}

#[tokio::test]
async fn test_health_unavailable() {
    let engine = MockEngine::unreachable();
    let readiness = initialize_engine(&engine, "test-project").await;
    let router = router_with(engine, readiness);

    let response = get_request(router, "/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["status"], "unavailable");
    assert!(json["reason"]
        .as_str()
        .unwrap()
        .contains("could not find default credentials"));
}
