use thiserror::Error;

/// Errors raised while talking to Earth Engine or acquiring credentials
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Transport-level failure (DNS, TLS, connection reset, body decoding)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Earth Engine answered with a non-success status
    #[error("Earth Engine API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials could not be located, parsed or exchanged for a token
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// No session has been established yet
    #[error("Earth Engine client library not initialized")]
    NotInitialized,

    /// Earth Engine answered with a body we could not interpret
    #[error("Invalid response from Earth Engine: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EngineError::InvalidResponse(err.to_string())
        } else {
            EngineError::Http(err.to_string())
        }
    }
}

/// Errors that can occur while producing a tile URL template
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The external call failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Earth Engine returned a descriptor without a map identifier
    #[error("No mapid returned from GEE. map_info={map_info}")]
    MissingMapId { map_info: String },

    /// Startup initialization failed, so no request can reach Earth Engine
    #[error("Earth Engine is not available: {reason}")]
    NotReady { reason: String },
}
