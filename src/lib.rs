// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! strava-sync: keep Strava OAuth credentials fresh and mirror athletes'
//! recent activities into durable storage.
//!
//! The consent flow stores one credential per athlete, the token refresher
//! keeps it valid, and the syncer pages through recent activities and upserts
//! them by activity ID.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{ActivityStore, CredentialStore};
use services::{ActivitySyncer, AuthorizationFlow, StravaApi, TokenRefresher};
use std::sync::Arc;
use time_utils::Clock;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub activities: Arc<dyn ActivityStore>,
    pub authorization: AuthorizationFlow,
    pub tokens: TokenRefresher,
    pub syncer: ActivitySyncer,
}

impl AppState {
    /// Wire the services together over the given storage, provider and clock.
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        activities: Arc<dyn ActivityStore>,
        strava: Arc<dyn StravaApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let authorization = AuthorizationFlow::new(&config, credentials.clone(), strava.clone());
        let tokens = TokenRefresher::new(credentials, strava.clone(), clock.clone());
        let syncer = ActivitySyncer::new(
            tokens.clone(),
            strava,
            activities.clone(),
            clock,
            config.sync_page_size,
            config.sync_max_pages,
        );

        Self {
            config,
            activities,
            authorization,
            tokens,
            syncer,
        }
    }
}
