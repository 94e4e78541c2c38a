// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage backend.
//!
//! Used by the test suite and by `STORAGE_BACKEND=memory` for local runs.
//! Each upsert is a single `DashMap::insert` on the natural key.

use crate::db::{ActivityStore, CredentialStore};
use crate::error::AppError;
use crate::models::{Activity, Credential};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// DashMap-backed credential and activity store.
#[derive(Clone, Default)]
pub struct MemoryDb {
    credentials: Arc<DashMap<String, Credential>>,
    activities: Arc<DashMap<u64, Activity>>,
    offline: Arc<AtomicBool>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StorageUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::StorageUnavailable(
                "Database not connected (offline mode)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryDb {
    async fn get_credential(&self, identity: &str) -> Result<Option<Credential>, AppError> {
        self.check_online()?;
        Ok(self.credentials.get(identity).map(|c| c.clone()))
    }

    async fn upsert_credential(&self, credential: &Credential) -> Result<(), AppError> {
        self.check_online()?;
        self.credentials
            .insert(credential.identity.clone(), credential.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for MemoryDb {
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), AppError> {
        self.check_online()?;
        self.activities.insert(activity.activity_id, activity.clone());
        Ok(())
    }

    async fn get_activity(&self, activity_id: u64) -> Result<Option<Activity>, AppError> {
        self.check_online()?;
        Ok(self.activities.get(&activity_id).map(|a| a.clone()))
    }

    async fn list_activities_for_owner(
        &self,
        owner_identity: &str,
    ) -> Result<Vec<Activity>, AppError> {
        self.check_online()?;
        let mut activities: Vec<Activity> = self
            .activities
            .iter()
            .filter(|entry| entry.owner_identity == owner_identity)
            .map(|entry| entry.value().clone())
            .collect();
        activities.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then(b.activity_id.cmp(&a.activity_id))
        });
        Ok(activities)
    }
}
