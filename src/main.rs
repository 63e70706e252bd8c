// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ski-Tracker API Server
//!
//! Stores ski runs uploaded by the mobile app and serves friend lists and
//! season leaderboards.

use anyhow::Context;
use ski_tracker::{config::Config, db::Db, services::AppleIdentityVerifier, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    ski_tracker::error::hide_internal_details(config.production);
    tracing::info!(
        port = config.port,
        production = config.production,
        "Starting Ski-Tracker API"
    );

    // Connect to PostgreSQL and bring the schema up to date
    let db = Db::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to apply migrations")?;

    let apple_verifier = Arc::new(
        AppleIdentityVerifier::new(&config).context("Failed to initialize Apple verifier")?,
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, apple_verifier));

    // Build router
    let app = ski_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ski_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
