// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity synchronization service.
//!
//! Handles the core workflow:
//! 1. Obtain a valid access token for the athlete
//! 2. Page through `/athlete/activities` for the lookback window
//! 3. Upsert every activity by its Strava ID
//!
//! Upserts are individually idempotent, so a sync that fails halfway can be
//! re-run and converges on the same rows.

use crate::db::ActivityStore;
use crate::error::{AppError, Result};
use crate::models::Activity;
use crate::services::strava::{StravaActivitySummary, StravaApi};
use crate::services::token::TokenRefresher;
use crate::time_utils::{format_utc_rfc3339, Clock, SECONDS_PER_DAY};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Outcome of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Activities fetched from Strava and upserted.
    pub count: usize,
}

/// Pulls recent activities from Strava into the activity store.
#[derive(Clone)]
pub struct ActivitySyncer {
    tokens: TokenRefresher,
    strava: Arc<dyn StravaApi>,
    activities: Arc<dyn ActivityStore>,
    clock: Arc<dyn Clock>,
    page_size: u32,
    max_pages: u32,
}

impl ActivitySyncer {
    pub fn new(
        tokens: TokenRefresher,
        strava: Arc<dyn StravaApi>,
        activities: Arc<dyn ActivityStore>,
        clock: Arc<dyn Clock>,
        page_size: u32,
        max_pages: u32,
    ) -> Self {
        Self {
            tokens,
            strava,
            activities,
            clock,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// Sync the activities that started within the last `lookback_days` days.
    ///
    /// Fetches pages until Strava returns an empty page or one shorter than
    /// the page size. A sync still receiving full pages after `max_pages`
    /// pages fails with `SyncFailed`; the pages already stored stay.
    pub async fn sync(&self, identity: &str, lookback_days: u32) -> Result<SyncResult> {
        let access_token = self.tokens.ensure_valid(identity).await?;
        let after = self.clock.now_unix() - i64::from(lookback_days) * SECONDS_PER_DAY;

        tracing::info!(identity, lookback_days, after, "Starting activity sync");

        let mut count = 0usize;
        let mut page = 1u32;

        loop {
            let summaries = self
                .strava
                .list_activities(&access_token, Some(after), page, self.page_size)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        identity,
                        page,
                        count,
                        rate_limited = e.is_rate_limited(),
                        error = %e,
                        "Activity fetch failed"
                    );
                    AppError::SyncFailed(e.to_string())
                })?;

            let fetched = summaries.len();
            if fetched == 0 {
                break;
            }

            self.upsert_page(identity, &summaries).await?;
            count += fetched;

            tracing::debug!(identity, page, fetched, "Stored activity page");

            if fetched < self.page_size as usize {
                break;
            }
            if page >= self.max_pages {
                tracing::warn!(identity, pages = page, count, "Sync page limit reached");
                return Err(AppError::SyncFailed(format!(
                    "Strava still returning full pages after {} pages",
                    page
                )));
            }
            page += 1;
        }

        tracing::info!(identity, count, pages = page, "Activity sync complete");
        Ok(SyncResult { count })
    }

    /// One page of the athlete's activities, straight from Strava.
    pub async fn recent_activities(
        &self,
        identity: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>> {
        let access_token = self.tokens.ensure_valid(identity).await?;

        self.strava
            .list_activities(&access_token, None, page, per_page)
            .await
            .map_err(|e| AppError::SyncFailed(e.to_string()))
    }

    async fn upsert_page(&self, identity: &str, summaries: &[StravaActivitySummary]) -> Result<()> {
        let synced_at = format_utc_rfc3339(chrono::Utc::now());
        let rows: Vec<Activity> = summaries
            .iter()
            .map(|summary| Activity::from_summary(identity, summary, &synced_at))
            .collect();
        let store = self.activities.clone();

        stream::iter(rows)
            .map(move |activity| {
                let store = store.clone();
                async move { store.upsert_activity(&activity).await }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<()>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>>>()?;

        Ok(())
    }
}
