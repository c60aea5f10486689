//! GEE Tiles - Earth Engine elevation tile URLs over HTTP.
//!
//! This binary initializes Earth Engine, builds the router and serves it.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gee_tiles::{
    config::Config,
    engine::{initialize_engine, CredentialSource, Readiness, RestEngine},
    server::{create_router, RouterConfig},
    tile::TileService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    run_serve(config).await
}

async fn run_serve(config: Config) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("GEE Tiles v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Earth Engine API: {}", config.api_url);
    info!("  Project: {}", config.project);
    info!("  CORS origins: {}", config.cors_origins.join(", "));

    let mut engine = match RestEngine::new(&config.api_url) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to create Earth Engine client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref token) = config.access_token {
        info!("  Session: pre-issued access token");
        engine = engine.with_session(&config.project, CredentialSource::AccessToken(token.clone()));
    }

    // Initialization failure is logged and reported by /health, never fatal
    let readiness = initialize_engine(&engine, &config.project).await;
    if let Readiness::Unavailable { ref reason } = readiness {
        warn!("Earth Engine unavailable, /gee-tiles will fail until restart: {}", reason);
    }

    let tile_service = TileService::new(engine, readiness);

    let router_config = RouterConfig::default()
        .with_cors_origins(config.cors_origins.clone())
        .with_tracing(!config.no_tracing);

    let router = create_router(tile_service, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/gee-tiles", addr);
    info!("    curl http://{}/health", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "gee_tiles=debug,tower_http=debug"
    } else {
        "gee_tiles=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
