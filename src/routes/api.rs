// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync trigger and activity read routes.

use crate::config::MAX_PAGE_SIZE;
use crate::error::{AppError, Result};
use crate::models::Activity;
use crate::services::strava::StravaActivitySummary;
use crate::services::SyncResult;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Upper bound on the lookback window (about ten years).
const MAX_LOOKBACK_DAYS: u32 = 3650;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sync", post(trigger_sync))
        .route("/api/activities/{identity}", get(get_stored_activities))
        .route("/api/activities/{identity}/recent", get(get_recent_activities))
}

/// Identities are Strava athlete IDs.
fn validate_identity(identity: &str) -> Result<()> {
    if identity.is_empty() || !identity.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "identity must be a Strava athlete ID".to_string(),
        ));
    }
    Ok(())
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SyncRequest {
    #[validate(length(min = 1, max = 32))]
    pub identity: String,
    #[serde(default = "default_lookback_days", alias = "lookbackDays", alias = "days")]
    #[validate(range(max = MAX_LOOKBACK_DAYS))]
    pub lookback_days: u32,
}

fn default_lookback_days() -> u32 {
    10
}

/// Pull the athlete's recent activities from Strava into storage.
async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<SyncResult>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid sync request: {}", e)))?;
    validate_identity(&request.identity)?;

    let result = state
        .syncer
        .sync(&request.identity, request.lookback_days)
        .await?;

    Ok(Json(result))
}

// ─── Activities ──────────────────────────────────────────────

/// Activities already synced for an athlete, newest first.
async fn get_stored_activities(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Result<Json<Vec<Activity>>> {
    validate_identity(&identity)?;
    let activities = state.activities.list_activities_for_owner(&identity).await?;
    Ok(Json(activities))
}

#[derive(Deserialize)]
struct RecentQuery {
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    30
}

/// Live view of the athlete's latest activities on Strava.
async fn get_recent_activities(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<StravaActivitySummary>>> {
    validate_identity(&identity)?;

    if query.page == 0 {
        return Err(AppError::BadRequest("page must be at least 1".to_string()));
    }
    if query.per_page == 0 || query.per_page > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "per_page must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    let activities = state
        .syncer
        .recent_activities(&identity, query.page, query.per_page)
        .await?;
    Ok(Json(activities))
}
