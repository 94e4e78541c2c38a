// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strava_sync::config::Config;
use strava_sync::db::{CredentialStore, FirestoreDb, MemoryDb};
use strava_sync::models::Credential;
use strava_sync::routes::create_router;
use strava_sync::services::strava::{
    StravaActivitySummary, StravaAthlete, TokenExchangeResponse, TokenRefreshResponse,
};
use strava_sync::services::{ProviderError, StravaApi};
use strava_sync::time_utils::ManualClock;
use strava_sync::AppState;

/// Fixed "now" for tests: 2026-01-01T00:00:00Z.
#[allow(dead_code)]
pub const NOW: i64 = 1_767_225_600;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project", std::time::Duration::from_secs(10))
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Scripted Strava provider that counts every call.
#[derive(Default)]
pub struct MockStrava {
    pub refresh_calls: AtomicUsize,
    pub exchange_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    /// Refresh tokens presented to `refresh_token`, in order.
    pub refresh_tokens_seen: Mutex<Vec<String>>,
    /// `after` values presented to `list_activities`, in order.
    pub after_seen: Mutex<Vec<Option<i64>>>,
    refresh_response: Mutex<Option<Result<TokenRefreshResponse, (u16, String)>>>,
    exchange_response: Mutex<Option<Result<TokenExchangeResponse, (u16, String)>>>,
    activities: Mutex<Vec<StravaActivitySummary>>,
    fail_on_page: Mutex<Option<u32>>,
    ignore_page: AtomicBool,
    refresh_delay: Mutex<Duration>,
}

#[allow(dead_code)]
impl MockStrava {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_refresh_ok(&self, access: &str, refresh: &str, expires_at: i64) {
        *self.refresh_response.lock().unwrap() = Some(Ok(TokenRefreshResponse {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at,
        }));
    }

    pub fn set_refresh_err(&self, status: u16, body: &str) {
        *self.refresh_response.lock().unwrap() = Some(Err((status, body.to_string())));
    }

    pub fn set_exchange_ok(&self, athlete_id: u64, access: &str, refresh: &str, expires_at: i64) {
        *self.exchange_response.lock().unwrap() = Some(Ok(TokenExchangeResponse {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at,
            athlete: StravaAthlete {
                id: athlete_id,
                firstname: Some("Test".to_string()),
                lastname: Some("Athlete".to_string()),
            },
        }));
    }

    pub fn set_exchange_err(&self, status: u16, body: &str) {
        *self.exchange_response.lock().unwrap() = Some(Err((status, body.to_string())));
    }

    /// Replace the athlete's activity list; pages are cut from it in order.
    pub fn set_activities(&self, activities: Vec<StravaActivitySummary>) {
        *self.activities.lock().unwrap() = activities;
    }

    pub fn fail_on_page(&self, page: Option<u32>) {
        *self.fail_on_page.lock().unwrap() = page;
    }

    /// Serve the first page for every `page` value, like a provider that
    /// ignores the parameter.
    pub fn ignore_page(&self, ignore: bool) {
        self.ignore_page.store(ignore, Ordering::SeqCst);
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

fn provider_error((status, body): (u16, String)) -> ProviderError {
    ProviderError::Status { status, body }
}

#[async_trait]
impl StravaApi for MockStrava {
    async fn exchange_code(&self, _code: &str) -> Result<TokenExchangeResponse, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.exchange_response.lock().unwrap().clone();
        scripted
            .unwrap_or_else(|| Err((400, r#"{"message":"Bad Request"}"#.to_string())))
            .map_err(provider_error)
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen
            .lock()
            .unwrap()
            .push(refresh_token.to_string());

        let delay = *self.refresh_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.refresh_response.lock().unwrap().clone();
        scripted
            .unwrap_or_else(|| Err((400, r#"{"message":"Bad Request"}"#.to_string())))
            .map_err(provider_error)
    }

    async fn list_activities(
        &self,
        _access_token: &str,
        after: Option<i64>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.after_seen.lock().unwrap().push(after);

        if *self.fail_on_page.lock().unwrap() == Some(page) {
            return Err(provider_error((
                500,
                r#"{"message":"Internal Server Error"}"#.to_string(),
            )));
        }

        let activities = self.activities.lock().unwrap();
        let page = if self.ignore_page.load(Ordering::SeqCst) {
            1
        } else {
            page
        };
        let start = (page.saturating_sub(1) * per_page) as usize;
        Ok(activities
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect())
    }
}

/// Provider summary with deterministic field values.
#[allow(dead_code)]
pub fn summary(id: u64, name: &str) -> StravaActivitySummary {
    StravaActivitySummary {
        id,
        name: name.to_string(),
        distance: 1000.0 * id as f64,
        moving_time: 60 * id as i64,
        elapsed_time: 90 * id as i64,
        start_date: format!("2025-12-{:02}T08:00:00Z", (id % 28) + 1),
        activity_type: "Run".to_string(),
    }
}

#[allow(dead_code)]
pub fn credential(identity: &str, access: &str, refresh: &str, expires_at: i64) -> Credential {
    Credential {
        identity: identity.to_string(),
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at,
        updated_at: String::new(),
    }
}

/// Services wired over an in-memory store, a scripted provider and a
/// manual clock set to [`NOW`].
#[allow(dead_code)]
pub struct Harness {
    pub db: MemoryDb,
    pub strava: Arc<MockStrava>,
    pub clock: Arc<ManualClock>,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: u32) -> Self {
        let mut config = Config::test_default();
        config.sync_page_size = page_size;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let db = MemoryDb::new();
        let strava = Arc::new(MockStrava::new());
        let clock = Arc::new(ManualClock::new(NOW));

        let state = Arc::new(AppState::new(
            config,
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            strava.clone(),
            clock.clone(),
        ));

        Self {
            db,
            strava,
            clock,
            state,
        }
    }

    pub async fn seed_credential(&self, credential: Credential) {
        self.db
            .upsert_credential(&credential)
            .await
            .expect("seed credential");
    }

    pub async fn stored_credential(&self, identity: &str) -> Option<Credential> {
        self.db.get_credential(identity).await.expect("read credential")
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}
