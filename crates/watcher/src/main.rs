//! Tier Watcher - Oracle Cloud free tier usage watcher
//!
//! This binary serves the current free tier usage of one compartment over
//! HTTP, querying the provider on every request.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use watcher_lib::{
    api::{self, AppState},
    observability::{StructuredLogger, WatcherMetrics},
    provider::OciConnector,
    UsageAggregator,
};

mod config;

const WATCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting tier-watcher");

    let config = config::WatcherConfig::load()?;
    let metrics = WatcherMetrics::new();

    let aggregator = match config.oci_settings().resolve() {
        Some(credentials) => {
            let logger = StructuredLogger::new(&credentials.region);
            let compartment_id = credentials.compartment_id().to_string();
            info!(
                region = %credentials.region,
                compartment = %compartment_id,
                "OCI credentials configured"
            );

            let connector = OciConnector::new(credentials, config.request_timeout())
                .context("failed to set up OCI client")?;
            Some(UsageAggregator::new(
                Arc::new(connector),
                compartment_id,
                metrics.clone(),
                logger,
            ))
        }
        None => {
            warn!("OCI credentials not configured; usage endpoints will report NOT_CONFIGURED");
            None
        }
    };

    let logger = StructuredLogger::new(config.oci_region.as_deref().unwrap_or("unconfigured"));
    logger.log_startup(WATCHER_VERSION, config.port, aggregator.is_some());

    let app_state = Arc::new(AppState::new(aggregator, config.api_key.clone()));

    let shutdown_logger = logger.clone();
    api::serve(config.port, app_state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shutting down");

    Ok(())
}
