//! One-time startup initialization.
//!
//! The outcome is captured in a [`Readiness`] value that the tile service
//! receives as a dependency. It is never refreshed.

use tracing::{error, info};

use super::EarthEngine;

/// Whether Earth Engine could be reached at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Unavailable { reason: String },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    /// Why initialization failed, if it did.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Readiness::Ready => None,
            Readiness::Unavailable { reason } => Some(reason),
        }
    }
}

/// Probe the engine, and fall back to Application Default Credentials if the
/// probe fails.
///
/// Errors are logged, never returned: a broken deployment still starts and
/// serves its other endpoints.
pub async fn initialize_engine<E>(engine: &E, project: &str) -> Readiness
where
    E: EarthEngine + ?Sized,
{
    if engine.asset_roots().await.is_ok() {
        info!("Earth Engine appears available (already initialized).");
        return Readiness::Ready;
    }

    info!(
        project = project,
        "Initializing Earth Engine with Application Default Credentials (ADC)."
    );

    match engine.initialize(project).await {
        Ok(()) => Readiness::Ready,
        Err(e) => {
            error!(error = %e, "Failed to initialize Earth Engine: {}", e);
            Readiness::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}
