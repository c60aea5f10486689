//! Configuration management for the GEE tile service.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with the `GEE_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use gee_tiles::config::Config;
//!
//! let config = Config::parse();
//! println!("Listening on {}", config.bind_address());
//! println!("Earth Engine project: {}", config.project);
//! ```
//!
//! # Environment Variables
//!
//! - `GEE_HOST` - Server bind address (default: 0.0.0.0)
//! - `GEE_PORT` - Server port (default: 8000)
//! - `GEE_PROJECT` - Cloud project used for the ADC fallback (default: soy-bridge-468406-s0)
//! - `GEE_ACCESS_TOKEN` - Pre-issued OAuth2 access token (optional)
//! - `GEE_API_URL` - Earth Engine API endpoint (default: https://earthengine.googleapis.com)
//! - `GEE_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use clap::Parser;
use url::Url;

use crate::engine::DEFAULT_API_URL;
use crate::server::DEFAULT_CORS_ORIGINS;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default Google Cloud project for Earth Engine.
pub const DEFAULT_PROJECT: &str = "soy-bridge-468406-s0";

// =============================================================================
// CLI Arguments
// =============================================================================

/// GEE Tiles - Earth Engine elevation tile URLs over HTTP.
///
/// Asks Google Earth Engine to render the ALOS AW3D30 surface model and
/// returns a tile URL template that web maps can consume.
#[derive(Parser, Debug, Clone)]
#[command(name = "gee-tiles")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GEE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GEE_PORT")]
    pub port: u16,

    // =========================================================================
    // Earth Engine Configuration
    // =========================================================================
    /// Google Cloud project used when initializing with Application Default Credentials.
    #[arg(long, default_value = DEFAULT_PROJECT, env = "GEE_PROJECT")]
    pub project: String,

    /// Pre-issued OAuth2 access token (e.g. from `gcloud auth print-access-token`).
    ///
    /// When set, the service starts with an existing session and only falls
    /// back to Application Default Credentials if that session does not work.
    #[arg(long, env = "GEE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Earth Engine API endpoint.
    #[arg(long, default_value = DEFAULT_API_URL, env = "GEE_API_URL")]
    pub api_url: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    #[arg(
        long,
        env = "GEE_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = DEFAULT_CORS_ORIGINS
    )]
    pub cors_origins: Vec<String>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.project.trim().is_empty() {
            return Err("Earth Engine project is required. Set --project or GEE_PROJECT".to_string());
        }

        match Url::parse(&self.api_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(format!(
                    "api_url must be http or https, got scheme '{}'",
                    url.scheme()
                ))
            }
            Err(e) => return Err(format!("api_url is not a valid URL: {}", e)),
        }

        for origin in &self.cors_origins {
            let parsed = Url::parse(origin)
                .map_err(|e| format!("Invalid CORS origin '{}': {}", origin, e))?;
            if parsed.origin().ascii_serialization() != origin.trim_end_matches('/') {
                return Err(format!(
                    "Invalid CORS origin '{}': expected scheme://host[:port]",
                    origin
                ));
            }
        }

        if matches!(&self.access_token, Some(token) if token.trim().is_empty()) {
            return Err("access_token must not be empty when set".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
