//! Database layer.
//!
//! Services talk to storage through [`CredentialStore`] and [`ActivityStore`];
//! [`FirestoreDb`] is the production backend and [`MemoryDb`] backs tests and
//! local runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Activity, Credential};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// OAuth credentials (keyed by identity)
    pub const CREDENTIALS: &str = "credentials";
    /// Synced activities (keyed by activity_id)
    pub const ACTIVITIES: &str = "activities";
}

/// Persistence for OAuth credentials, one per identity.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the credential for an identity.
    async fn get_credential(&self, identity: &str) -> Result<Option<Credential>, AppError>;

    /// Create or replace the credential stored under `credential.identity`.
    async fn upsert_credential(&self, credential: &Credential) -> Result<(), AppError>;
}

/// Persistence for activities, keyed by Strava activity ID.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Create or replace the row stored under `activity.activity_id`.
    ///
    /// Must be a single keyed write: concurrent upserts of the same ID leave
    /// exactly one row holding one writer's values.
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), AppError>;

    async fn get_activity(&self, activity_id: u64) -> Result<Option<Activity>, AppError>;

    /// All activities owned by an identity, newest first.
    async fn list_activities_for_owner(&self, owner_identity: &str)
        -> Result<Vec<Activity>, AppError>;
}
