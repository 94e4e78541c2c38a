// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stored OAuth credential.

use serde::{Deserialize, Serialize};

/// One access/refresh token pair per athlete, stored in the `credentials`
/// collection under the athlete ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Strava athlete ID (also used as document ID)
    pub identity: String,
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires (Unix seconds)
    pub expires_at: i64,
    /// Last write (RFC 3339)
    #[serde(default)]
    pub updated_at: String,
}

impl Credential {
    /// Whether the access token can no longer be used at `now_unix`.
    ///
    /// A token is expired at the exact second it reaches `expires_at`.
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        now_unix >= self.expires_at
    }
}
