//! Visualization requests and the map descriptors Earth Engine returns for them.

use serde::{Deserialize, Serialize};

use super::expression::{Image, ImageCollection};

/// JAXA ALOS World 3D 30m digital surface model.
pub const ELEVATION_DATASET: &str = "JAXA/ALOS/AW3D30/V4_1";

/// Band holding surface height in metres.
pub const ELEVATION_BAND: &str = "DSM";

/// Lower bound of the rendered value range (metres).
pub const ELEVATION_MIN: f64 = 0.0;

/// Upper bound of the rendered value range (metres).
pub const ELEVATION_MAX: f64 = 5000.0;

/// Blue to white colour ramp, low to high.
pub const ELEVATION_PALETTE: [&str; 5] = ["0000ff", "00ffff", "ffff00", "ff0000", "ffffff"];

/// Value range and colour ramp for a single-band image.
#[derive(Debug, Clone, PartialEq)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

/// Everything needed to ask Earth Engine for one rendered layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationRequest {
    pub dataset: String,
    pub band: String,
    pub vis: VisParams,
}

impl VisualizationRequest {
    /// The elevation layer this service renders.
    pub fn elevation() -> Self {
        Self {
            dataset: ELEVATION_DATASET.to_string(),
            band: ELEVATION_BAND.to_string(),
            vis: VisParams {
                min: ELEVATION_MIN,
                max: ELEVATION_MAX,
                palette: ELEVATION_PALETTE.iter().map(|c| c.to_string()).collect(),
            },
        }
    }

    /// Mosaic the dataset and keep the requested band.
    pub fn image(&self) -> Image {
        ImageCollection::load(&self.dataset)
            .mosaic()
            .select([self.band.as_str()])
    }
}

/// Map identifier and access token issued by Earth Engine.
///
/// Current Earth Engine deployments return an empty token; the identifier
/// alone is enough to fetch tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDescriptor {
    #[serde(default)]
    pub mapid: String,

    #[serde(default)]
    pub token: String,
}

impl MapDescriptor {
    pub fn new(mapid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            mapid: mapid.into(),
            token: token.into(),
        }
    }

    /// Whether Earth Engine actually issued an identifier.
    pub fn has_mapid(&self) -> bool {
        !self.mapid.trim().is_empty()
    }
}
