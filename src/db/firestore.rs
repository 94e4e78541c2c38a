// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed credential and activity storage.
//!
//! Both collections use the natural key as document ID (athlete ID for
//! credentials, activity ID for activities). Every upsert is one document
//! `set`, so repeated or concurrent writes converge on a single document.

use crate::db::{collections, ActivityStore, CredentialStore};
use crate::error::AppError;
use crate::models::{Activity, Credential};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Placeholder bearer token; the emulator does not verify it.
const EMULATOR_TOKEN: &str = "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0.";

fn storage_error(e: impl std::fmt::Display) -> AppError {
    AppError::StorageUnavailable(e.to_string())
}

/// Run a storage call under `deadline`; a call that overruns it is reported
/// as `StorageUnavailable`.
async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| storage_error(format!("Firestore call timed out after {:?}", deadline)))?
}

#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    timeout: Duration,
}

impl FirestoreDb {
    /// Connect to Firestore for `project_id`.
    ///
    /// When `FIRESTORE_EMULATOR_HOST` is set the client talks to the emulator
    /// without looking up Google credentials. Every later call is bounded by
    /// `timeout`.
    pub async fn new(project_id: &str, timeout: Duration) -> Result<Self, AppError> {
        let emulator = std::env::var("FIRESTORE_EMULATOR_HOST").is_ok();

        let connect = async {
            if emulator {
                firestore::FirestoreDb::with_options_token_source(
                    firestore::FirestoreDbOptions::new(project_id.to_string()),
                    gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
                    emulator_token_source(),
                )
                .await
            } else {
                firestore::FirestoreDb::new(project_id).await
            }
            .map_err(|e| storage_error(format!("Failed to connect to Firestore: {}", e)))
        };
        let client = with_deadline(timeout, connect).await?;

        tracing::info!(project = project_id, emulator, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            timeout,
        })
    }

    /// A client with no connection; every operation fails with
    /// `StorageUnavailable`.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            timeout: Duration::from_secs(1),
        }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| storage_error("Database not connected (offline mode)"))
    }

    async fn get_document<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        let client = self.get_client()?;
        with_deadline(self.timeout, async {
            client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj::<T>()
                .one(id)
                .await
                .map_err(storage_error)
        })
        .await
    }

    async fn set_document<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let client = self.get_client()?;
        with_deadline(self.timeout, async {
            let _: () = client
                .fluent()
                .update()
                .in_col(collection)
                .document_id(id)
                .object(object)
                .execute()
                .await
                .map_err(storage_error)?;
            Ok(())
        })
        .await
    }
}

fn emulator_token_source() -> gcloud_sdk::TokenSourceType {
    let source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
        Ok(gcloud_sdk::Token {
            token_type: "Bearer".to_string(),
            token: gcloud_sdk::SecretValue::new(EMULATOR_TOKEN.to_string().into()),
            expiry: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    });
    gcloud_sdk::TokenSourceType::ExternalSource(Box::new(source))
}

#[async_trait]
impl CredentialStore for FirestoreDb {
    async fn get_credential(&self, identity: &str) -> Result<Option<Credential>, AppError> {
        self.get_document(collections::CREDENTIALS, identity).await
    }

    async fn upsert_credential(&self, credential: &Credential) -> Result<(), AppError> {
        self.set_document(collections::CREDENTIALS, &credential.identity, credential)
            .await
    }
}

#[async_trait]
impl ActivityStore for FirestoreDb {
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), AppError> {
        let id = activity.activity_id.to_string();
        self.set_document(collections::ACTIVITIES, &id, activity)
            .await
    }

    async fn get_activity(&self, activity_id: u64) -> Result<Option<Activity>, AppError> {
        self.get_document(collections::ACTIVITIES, &activity_id.to_string())
            .await
    }

    /// Needs a composite index on (`owner_identity`, `start_date` desc).
    async fn list_activities_for_owner(
        &self,
        owner_identity: &str,
    ) -> Result<Vec<Activity>, AppError> {
        let owner = owner_identity.to_string();
        let client = self.get_client()?;
        with_deadline(self.timeout, async {
            client
                .fluent()
                .select()
                .from(collections::ACTIVITIES)
                .filter(move |q| q.for_all([q.field("owner_identity").eq(owner.clone())]))
                .order_by([("start_date", firestore::FirestoreQueryDirection::Descending)])
                .obj()
                .query()
                .await
                .map_err(storage_error)
        })
        .await
    }
}
