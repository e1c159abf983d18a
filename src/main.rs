// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StrideSync API Server
//!
//! Serves the run tracker, shoe inventory and statistics to the mobile and
//! web clients over a local JSON API.

use std::sync::Arc;
use stridesync::{
    clock::SystemClock, config::Config, db::KvStore, services::ChannelLocationProvider, AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting StrideSync API");

    // Open the document store
    let kv = KvStore::open_dir(&config.data_dir).await?;

    let state = Arc::new(
        AppState::build(
            config.clone(),
            kv,
            Arc::new(SystemClock),
            ChannelLocationProvider::default(),
        )
        .await,
    );
    if let Some(error) = state.store.lock().await.error() {
        tracing::warn!(error = %error, "Starting with empty state");
    }

    // Build router
    let app = stridesync::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Write anything still inside the debounce window
    if let Err(e) = state.store.lock().await.flush().await {
        tracing::error!(error = %e, "Final flush failed");
    }
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stridesync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
