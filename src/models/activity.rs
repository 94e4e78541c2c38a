// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity model for storage and API.

use crate::services::strava::StravaActivitySummary;
use serde::{Deserialize, Serialize};

/// Stored activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Strava activity ID (also used as document ID)
    pub activity_id: u64,
    /// Athlete ID of the credential the activity was fetched with
    pub owner_identity: String,
    /// Activity name/title
    pub name: String,
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: i64,
    /// Elapsed time in seconds
    pub elapsed_time: i64,
    /// Start date/time (ISO 8601, as reported by Strava)
    pub start_date: String,
    /// Activity type (Ride, Run, Hike, etc.)
    #[serde(rename = "type")]
    pub activity_type: String,
    /// When this row was last written
    pub synced_at: String,
}

impl Activity {
    /// Map a provider summary onto a storage row, taking every mutable field
    /// from the provider.
    pub fn from_summary(
        owner_identity: &str,
        summary: &StravaActivitySummary,
        synced_at: &str,
    ) -> Self {
        Self {
            activity_id: summary.id,
            owner_identity: owner_identity.to_string(),
            name: summary.name.clone(),
            distance: summary.distance,
            moving_time: summary.moving_time,
            elapsed_time: summary.elapsed_time,
            start_date: summary.start_date.clone(),
            activity_type: summary.activity_type.clone(),
            synced_at: synced_at.to_string(),
        }
    }
}
