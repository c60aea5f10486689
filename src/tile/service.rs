//! Tile Service for producing tile URL templates.
//!
//! The TileService is the main entry point for `/gee-tiles`. It orchestrates:
//! - Readiness check
//! - Building the elevation visualization request
//! - Asking Earth Engine for a map descriptor
//! - Formatting the tile URL template
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    map_tiles()                          │    │
//! │  │  1. Check readiness    3. get_map_id (Earth Engine)     │    │
//! │  │  2. Build request      4. Validate mapid, format URL    │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                                     │               │
//! │           ▼                                     ▼               │
//! │    ┌──────────────┐                   ┌──────────────────┐      │
//! │    │  Readiness   │                   │   EarthEngine    │      │
//! │    └──────────────┘                   └──────────────────┘      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::engine::{EarthEngine, MapDescriptor, Readiness, VisualizationRequest};
use crate::error::TileError;

/// Host serving Earth Engine map tiles.
pub const TILE_URL_BASE: &str = "https://earthengine.googleapis.com";

/// Build the `{z}/{x}/{y}` tile URL template for a map id.
///
/// The map token is not part of the URL; current Earth Engine map ids are
/// usable on their own.
pub fn tile_url_template(mapid: &str) -> String {
    format!("{}/v1/{}/tiles/{{z}}/{{x}}/{{y}}", TILE_URL_BASE, mapid)
}

// =============================================================================
// Map Tiles
// =============================================================================

/// Response from the tile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapTiles {
    /// Descriptor exactly as Earth Engine returned it
    pub map_info: MapDescriptor,

    /// Tile URL template with literal `{z}`, `{x}`, `{y}` placeholders
    pub tile_url: String,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service turning the elevation layer into a tile URL template.
///
/// # Type Parameters
///
/// * `E` - The Earth Engine client (e.g. [`crate::engine::RestEngine`])
///
/// # Example
///
/// ```ignore
/// let readiness = initialize_engine(&engine, "my-project").await;
/// let service = TileService::new(engine, readiness);
///
/// let tiles = service.map_tiles().await?;
/// println!("{}", tiles.tile_url);
/// ```
pub struct TileService<E: EarthEngine + ?Sized> {
    engine: Arc<E>,
    readiness: Readiness,
}

impl<E: EarthEngine> TileService<E> {
    /// Create a tile service owning the engine.
    pub fn new(engine: E, readiness: Readiness) -> Self {
        Self::with_shared_engine(Arc::new(engine), readiness)
    }
}

impl<E: EarthEngine + ?Sized> TileService<E> {
    /// Create a tile service with a shared engine.
    pub fn with_shared_engine(engine: Arc<E>, readiness: Readiness) -> Self {
        Self { engine, readiness }
    }

    /// Startup readiness the service was built with.
    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Request a map for the elevation layer and build its tile URL.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Startup initialization failed
    /// - The Earth Engine call fails (unknown dataset, bad credentials, network)
    /// - Earth Engine returns no map id
    pub async fn map_tiles(&self) -> Result<MapTiles, TileError> {
        if let Readiness::Unavailable { reason } = &self.readiness {
            return Err(TileError::NotReady {
                reason: reason.clone(),
            });
        }

        let request = VisualizationRequest::elevation();
        let image = request.image();

        let map_info = self.engine.get_map_id(&image, &request.vis).await?;
        info!(mapid = %map_info.mapid, token = %map_info.token, "GEE map_info");

        if !map_info.has_mapid() {
            return Err(TileError::MissingMapId {
                map_info: format!("{:?}", map_info),
            });
        }

        let tile_url = tile_url_template(&map_info.mapid);
        Ok(MapTiles { map_info, tile_url })
    }
}

impl<E: EarthEngine + ?Sized> Clone for TileService<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            readiness: self.readiness.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
