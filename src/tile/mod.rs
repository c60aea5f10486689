//! Tile service layer.
//!
//! Sits between the HTTP handlers and the Earth Engine client:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │   (readiness, request, URL template)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            EarthEngine                  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Nothing is cached: every call asks Earth Engine for a fresh map.

mod service;

pub use service::{tile_url_template, MapTiles, TileService, TILE_URL_BASE};
