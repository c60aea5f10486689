//! Router configuration for the GEE tile service.
//!
//! This module defines the HTTP routes and applies middleware for CORS and
//! request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /            - Welcome message
//! /gee-tiles   - Tile URL template
//! /health      - Startup readiness
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gee_tiles::server::routes::{create_router, RouterConfig};
//!
//! let router = create_router(tile_service, RouterConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{gee_tiles_handler, health_handler, root_handler, AppState};
use crate::engine::EarthEngine;
use crate::tile::TileService;

/// Origins allowed to call the API from a browser.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] =
    ["http://localhost:5173", "https://your-production-domain.com"];

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins. Requests from any other origin get no CORS
    /// headers and are rejected by the browser.
    pub cors_origins: Vec<String>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    /// Replace the allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - The three public routes
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<E>(tile_service: TileService<E>, config: RouterConfig) -> Router
where
    E: EarthEngine + ?Sized + 'static,
{
    let app_state = AppState::new(tile_service);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/", get(root_handler))
        .route("/gee-tiles", get(gee_tiles_handler::<E>))
        .route("/health", get(health_handler::<E>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// Credentials are allowed, so wildcards are not an option: methods and
/// headers are mirrored from the preflight request instead.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(600))
}

// =============================================================================
// Tests
// =============================================================================
