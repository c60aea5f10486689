//! # GEE Tiles
//!
//! A small HTTP service that asks Google Earth Engine to render the JAXA ALOS
//! AW3D30 digital surface model and hands map clients a tile URL template.
//!
//! All image processing happens inside Earth Engine. This crate builds the
//! request (load collection → mosaic → select band → visualize), obtains a
//! map id through the Earth Engine REST API and turns it into
//! `https://earthengine.googleapis.com/v1/{mapid}/tiles/{z}/{x}/{y}`.
//!
//! ## Architecture
//!
//! - [`engine`] - Earth Engine client: expression builders, credentials, REST API
//! - [`tile`] - Tile service producing URL templates
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use gee_tiles::{create_router, initialize_engine, RestEngine, RouterConfig, TileService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = RestEngine::new("https://earthengine.googleapis.com").unwrap();
//!     let readiness = initialize_engine(&engine, "my-project").await;
//!
//!     let router = create_router(TileService::new(engine, readiness), RouterConfig::default());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use config::Config;
pub use engine::{
    initialize_engine, AssetRoot, CredentialSource, EarthEngine, Image, ImageCollection,
    MapDescriptor, Readiness, RestEngine, VisParams, VisualizationRequest,
};
pub use error::{EngineError, TileError};
pub use server::{
    create_router, gee_tiles_handler, health_handler, root_handler, AppState, ErrorResponse,
    HealthResponse, RouterConfig,
};
pub use tile::{tile_url_template, MapTiles, TileService};
