//! HTTP server layer for the GEE tile service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                  GET /   GET /gee-tiles   GET /health           │
//! │                                                                 │
//! │  ┌─────────────────────────┐  ┌─────────────────────────────┐   │
//! │  │        handlers         │  │           routes            │   │
//! │  │       (requests)        │  │   (router, CORS, tracing)   │   │
//! │  └─────────────────────────┘  └─────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    gee_tiles_handler, health_handler, root_handler, AppState, ErrorResponse, HealthResponse,
    WelcomeResponse, TILE_FAILURE_PREFIX, WELCOME_MESSAGE,
};
pub use routes::{create_router, RouterConfig, DEFAULT_CORS_ORIGINS};
