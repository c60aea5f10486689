//! HTTP request handlers for the GEE tile API.
//!
//! # Endpoints
//!
//! - `GET /` - Welcome message
//! - `GET /gee-tiles` - Tile URL template for the elevation layer
//! - `GET /health` - Startup readiness

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::engine::{EarthEngine, Readiness};
use crate::error::TileError;
use crate::tile::{MapTiles, TileService};

/// Fixed greeting returned by the root endpoint.
pub const WELCOME_MESSAGE: &str = "Welcome to the GEE Tile Service!";

/// Prefix of every `/gee-tiles` failure detail.
pub const TILE_FAILURE_PREFIX: &str = "Failed to generate GEE tiles";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<E: EarthEngine + ?Sized> {
    /// The tile service for processing tile requests
    pub tile_service: Arc<TileService<E>>,
}

impl<E: EarthEngine + ?Sized> AppState<E> {
    /// Create a new application state with the given tile service.
    pub fn new(tile_service: TileService<E>) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
        }
    }
}

impl<E: EarthEngine + ?Sized> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Root endpoint response.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unavailable"
    pub status: String,

    /// Service version
    pub version: String,

    /// Why startup initialization failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// Every failure is a 500 carrying the underlying message; nothing else from
/// the failed call reaches the client.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let error_type = match &self {
            TileError::Engine(_) => "engine_error",
            TileError::MissingMapId { .. } => "missing_mapid",
            TileError::NotReady { .. } => "not_ready",
        };

        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Failed to build GEE tile URL: {}",
            self
        );

        let detail = format!("{}: {}", TILE_FAILURE_PREFIX, self);
        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle root requests.
///
/// # Endpoint
///
/// `GET /`
///
/// # Response
///
/// `200 OK` with JSON body `{"message": "Welcome to the GEE Tile Service!"}`
pub async fn root_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// Handle tile URL requests.
///
/// # Endpoint
///
/// `GET /gee-tiles`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "map_info": { "mapid": "projects/p/maps/abc", "token": "" },
///   "tile_url": "https://earthengine.googleapis.com/v1/projects/p/maps/abc/tiles/{z}/{x}/{y}"
/// }
/// ```
///
/// # Errors
///
/// - `500 Internal Server Error`: `{"detail": "Failed to generate GEE tiles: <message>"}`
pub async fn gee_tiles_handler<E: EarthEngine + ?Sized>(
    State(state): State<AppState<E>>,
) -> Result<Json<MapTiles>, TileError> {
    let tiles = state.tile_service.map_tiles().await?;
    Ok(Json(tiles))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// - `200 OK` with `{"status": "healthy", "version": "0.1.0"}` once Earth
///   Engine was initialized at startup
/// - `503 Service Unavailable` with `{"status": "unavailable", "version": ..., "reason": ...}`
///   otherwise
pub async fn health_handler<E: EarthEngine + ?Sized>(
    State(state): State<AppState<E>>,
) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    match state.tile_service.readiness() {
        Readiness::Ready => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                version,
                reason: None,
            }),
        ),
        Readiness::Unavailable { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                version,
                reason: Some(reason.clone()),
            }),
        ),
    }
}

// =============================================================================
// Tests
// =============================================================================
