//! Auth Service - Main Entry Point
//!
//! Keeps the server credential fresh until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::Context;
use auth_service::device::MemoryDeviceAuthorizationStore;
use auth_service::shutdown::wait_for_signal;
use auth_service::{AuthService, Config};
use rust_common::{build_http_client, init_tracing};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    init_tracing(&config.tracing_config()).context("initializing tracing")?;

    info!(
        version = %config.service.version,
        auth_service_url = %config.auth_service_url,
        "Starting Auth Service"
    );

    let http = build_http_client(&config.http_config()).context("building HTTP client")?;
    let service = AuthService::new(
        &config,
        http,
        Arc::new(MemoryDeviceAuthorizationStore::new()),
    )
    .context("wiring auth components")?;

    service.start();

    wait_for_signal().await;

    if tokio::time::timeout(config.shutdown_timeout(), service.close())
        .await
        .is_err()
    {
        warn!("Shutdown timeout reached, abandoning server token refresh");
    }

    info!("Auth Service stopped");
    Ok(())
}
