// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MapMyStairs API Server
//!
//! Times stair climbs, posts them to MapMyFitness as workouts and ranks
//! climbers per stairwell.

use mapmystairs::{config::Config, db::Database, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, public_url = %config.public_url, "Starting MapMyStairs");

    // Connect to the database and bring the schema up to date
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!("Database migrations applied");

    if db.get_organization(config.default_organization_id).await?.is_none() {
        tracing::warn!(
            organization_id = config.default_organization_id,
            "Default organization does not exist; new users will have none"
        );
    }

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, db));

    // Build router
    let app = mapmystairs::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mapmystairs=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
