// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! strava-sync API Server
//!
//! Runs the Strava consent flow and syncs athletes' recent activities into
//! Firestore (or memory, for local runs).

use std::sync::Arc;
use strava_sync::{
    config::{Config, StorageBackend},
    db::{ActivityStore, CredentialStore, FirestoreDb, MemoryDb},
    services::StravaClient,
    time_utils::SystemClock,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        storage = ?config.storage_backend,
        page_size = config.sync_page_size,
        "Starting strava-sync API"
    );

    let (credentials, activities): (Arc<dyn CredentialStore>, Arc<dyn ActivityStore>) =
        match config.storage_backend {
            StorageBackend::Firestore => {
                let db = FirestoreDb::new(&config.gcp_project_id, config.storage_timeout).await?;
                (Arc::new(db.clone()), Arc::new(db))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                let db = MemoryDb::new();
                (Arc::new(db.clone()), Arc::new(db))
            }
        };

    let strava = Arc::new(StravaClient::new(&config)?);

    let state = Arc::new(AppState::new(
        config.clone(),
        credentials,
        activities,
        strava,
        Arc::new(SystemClock),
    ));

    let app = strava_sync::routes::create_router(state);

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
                .add_directive("strava_sync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
