// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! RTR Messages Server
//!
//! Generates the weekly club run announcement for each platform from the
//! route schedule, enriched with Strava and LocationIQ data when configured.

use rtr_messages::{
    config::Config,
    services::{EnrichmentService, PlaceClient, RouteCatalog, StravaClient, StravaService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting RTR message generator");

    for notice in config.setup_notices() {
        tracing::warn!("{}", notice);
    }

    // Load the route schedule
    tracing::info!(path = %config.schedule_path, "Loading route schedule");
    let catalog = RouteCatalog::load_from_file(&config.schedule_path)?;
    tracing::info!(count = catalog.routes().len(), "Route schedule loaded");

    // Strava client (admin OAuth) and token-managed service (enrichment)
    let strava_client = config
        .strava_credentials()
        .map(|(id, secret)| StravaClient::new(id.to_string(), secret.to_string()));
    let strava_service = match (&strava_client, &config.strava_refresh_token) {
        (Some(client), Some(refresh_token)) => {
            tracing::info!("Strava enrichment enabled");
            Some(StravaService::new(client.clone(), refresh_token.clone()))
        }
        _ => None,
    };

    let places = config.locationiq_api_key.clone().map(|key| {
        tracing::info!("LocationIQ place lookup enabled");
        PlaceClient::new(key)
    });

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        catalog,
        enrichment: EnrichmentService::new(strava_service, places),
        strava_client,
    });

    // Build router
    let app = rtr_messages::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
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
                .add_directive("rtr_messages=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
