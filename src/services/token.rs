// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token lifecycle.
//!
//! [`TokenRefresher::ensure_valid`] hands out a usable access token for an
//! athlete, refreshing it with Strava once it has expired. Refreshes for the
//! same athlete are serialized: Strava rotates the refresh token on every
//! exchange, so two racing refreshes would leave the store holding a refresh
//! token that no longer matches the access token in use.

use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::Credential;
use crate::services::strava::StravaApi;
use crate::time_utils::{format_utc_rfc3339, Clock};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-identity refresh locks, shared by every clone of the refresher.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Hands out valid access tokens, refreshing expired ones.
#[derive(Clone)]
pub struct TokenRefresher {
    credentials: Arc<dyn CredentialStore>,
    strava: Arc<dyn StravaApi>,
    clock: Arc<dyn Clock>,
    /// Per-user mutex to serialize token refresh operations.
    refresh_locks: RefreshLocks,
}

impl TokenRefresher {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        strava: Arc<dyn StravaApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            strava,
            clock,
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Get a valid (non-expired) access token for the given identity.
    ///
    /// 1. Read the stored credential (`NotAuthorized` if none)
    /// 2. Still valid: return it without touching the network
    /// 3. Expired: take the per-identity lock and re-read, since another
    ///    task may have refreshed while we waited
    /// 4. Still expired: exchange the refresh token and store the new triple
    pub async fn ensure_valid(&self, identity: &str) -> Result<String, AppError> {
        let credential = self.load(identity).await?;
        let now = self.clock.now_unix();

        if !credential.is_expired_at(now) {
            return Ok(credential.access_token);
        }

        let lock = self
            .refresh_locks
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.refresh_locked(identity, now).await
        };

        drop(lock);
        self.release_lock(identity);
        result
    }

    /// Refresh under the identity's lock.
    async fn refresh_locked(&self, identity: &str, now: i64) -> Result<String, AppError> {
        // Double-check: the previous lock holder may have refreshed already.
        let credential = self.load(identity).await?;
        if !credential.is_expired_at(self.clock.now_unix()) {
            tracing::debug!(identity, "Token refreshed by concurrent request");
            return Ok(credential.access_token);
        }

        tracing::info!(
            identity,
            expires_at = credential.expires_at,
            now,
            "Access token expired, refreshing"
        );

        let refreshed = self
            .strava
            .refresh_token(&credential.refresh_token)
            .await
            .map_err(|e| {
                tracing::warn!(
                    identity,
                    rate_limited = e.is_rate_limited(),
                    error = %e,
                    "Strava token refresh failed"
                );
                AppError::RefreshFailed(e.to_string())
            })?;

        // Always store the returned refresh token; Strava may rotate it.
        let updated = Credential {
            identity: identity.to_string(),
            access_token: refreshed.access_token.clone(),
            refresh_token: refreshed.refresh_token.clone(),
            expires_at: refreshed.expires_at_secs(),
            updated_at: format_utc_rfc3339(chrono::Utc::now()),
        };
        self.credentials.upsert_credential(&updated).await?;

        tracing::info!(identity, expires_at = updated.expires_at, "Token refreshed");
        Ok(updated.access_token)
    }

    /// Drop the identity's lock entry once no task holds or awaits it.
    ///
    /// The check runs under the map's shard lock, the same lock new waiters
    /// take to clone the entry, so an entry is never removed from under one.
    fn release_lock(&self, identity: &str) {
        self.refresh_locks
            .remove_if(identity, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn load(&self, identity: &str) -> Result<Credential, AppError> {
        self.credentials
            .get_credential(identity)
            .await?
            .ok_or_else(|| AppError::NotAuthorized(identity.to_string()))
    }
}
