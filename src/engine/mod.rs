//! Earth Engine client layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          EarthEngine Trait              │
//! │  asset_roots / initialize / get_map_id  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              RestEngine                 │
//! │  (REST v1 over reqwest + ADC tokens)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Images are described client-side with the lazy builders in
//! [`expression`] and only evaluated when a map is requested.

pub mod credentials;
pub mod expression;
pub mod readiness;
pub mod rest;
pub mod visualization;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::EngineError;

pub use credentials::{CredentialSource, TokenProvider};
pub use expression::{Expression, FunctionInvocation, Image, ImageCollection, ValueNode};
pub use readiness::{initialize_engine, Readiness};
pub use rest::{EnvLookup, RestEngine, DEFAULT_API_URL};
pub use visualization::{MapDescriptor, VisParams, VisualizationRequest};

/// A top-level asset folder visible to the current session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetRoot {
    pub name: String,

    #[serde(default, rename = "type")]
    pub asset_type: String,
}

/// Operations this service needs from Earth Engine.
///
/// This abstraction lets the tile service and HTTP layer run against the real
/// REST API or an in-memory stand-in.
#[async_trait]
pub trait EarthEngine: Send + Sync {
    /// List the asset roots of the current session.
    ///
    /// Cheap call used as a connectivity probe. Fails with
    /// [`EngineError::NotInitialized`] when no session exists.
    async fn asset_roots(&self) -> Result<Vec<AssetRoot>, EngineError>;

    /// Establish a session for `project` using Application Default Credentials.
    async fn initialize(&self, project: &str) -> Result<(), EngineError>;

    /// Render `image` with `vis` and return the map descriptor for its tiles.
    async fn get_map_id(&self, image: &Image, vis: &VisParams)
        -> Result<MapDescriptor, EngineError>;
}
