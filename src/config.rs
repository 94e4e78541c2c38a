// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Built once at startup and handed to each service by reference; nothing
//! reads the environment after `Config::from_env` returns.

use std::env;
use std::time::Duration;

/// Strava caps `per_page` on the activities endpoint at 200.
pub const MAX_PAGE_SIZE: u32 = 200;

/// At the default page size this covers 50,000 activities in one window.
pub const DEFAULT_SYNC_MAX_PAGES: u32 = 500;

/// Which persistence backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Firestore => "firestore",
            StorageBackend::Memory => "memory",
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Strava OAuth application ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Callback URL registered with Strava
    pub strava_redirect_uri: String,
    /// Requested OAuth scope
    pub strava_scope: String,
    /// Base URL for `/athlete/activities` and friends
    pub strava_api_base_url: String,
    /// Base URL for `/authorize` and `/token`
    pub strava_oauth_base_url: String,

    // --- Server ---
    /// Server port
    pub port: u16,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    pub storage_backend: StorageBackend,
    /// Deadline for each Firestore call
    pub storage_timeout: Duration,

    // --- Outbound calls and sync ---
    /// Timeout applied to every request sent to Strava
    pub http_timeout: Duration,
    /// Activities requested per page
    pub sync_page_size: u32,
    /// Pages fetched per sync before it is abandoned as runaway
    pub sync_max_pages: u32,
    /// Wait before the single retry after a 429
    pub rate_limit_retry_delay: Duration,
}

impl Config {
    /// Config for tests; points at the real Strava URLs but never uses them.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            strava_redirect_uri: "http://localhost:8080/auth/strava/callback".to_string(),
            strava_scope: "activity:read_all".to_string(),
            strava_api_base_url: "https://www.strava.com/api/v3".to_string(),
            strava_oauth_base_url: "https://www.strava.com/oauth".to_string(),
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            storage_backend: StorageBackend::Memory,
            storage_timeout: Duration::from_secs(5),
            http_timeout: Duration::from_secs(5),
            sync_page_size: 100,
            sync_max_pages: DEFAULT_SYNC_MAX_PAGES,
            rate_limit_retry_delay: Duration::from_millis(10),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            strava_client_id: required("STRAVA_CLIENT_ID")?,
            strava_client_secret: required("STRAVA_CLIENT_SECRET")?,
            strava_redirect_uri: required("STRAVA_REDIRECT_URI")?,
            strava_scope: env::var("STRAVA_SCOPE")
                .unwrap_or_else(|_| "activity:read_all".to_string()),
            strava_api_base_url: env::var("STRAVA_API_BASE_URL")
                .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string()),
            strava_oauth_base_url: env::var("STRAVA_OAUTH_BASE_URL")
                .unwrap_or_else(|_| "https://www.strava.com/oauth".to_string()),

            port: parsed("PORT", 8080)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage_backend: env::var("STORAGE_BACKEND")
                .map(|v| v.parse::<StorageBackend>())
                .unwrap_or(Ok(StorageBackend::Firestore))?,
            storage_timeout: Duration::from_secs(parsed("STORAGE_TIMEOUT_SECS", 10)?),

            http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 15)?),
            sync_page_size: parsed::<u32>("SYNC_PAGE_SIZE", 100)?.clamp(1, MAX_PAGE_SIZE),
            sync_max_pages: parsed::<u32>("SYNC_MAX_PAGES", DEFAULT_SYNC_MAX_PAGES)?.max(1),
            rate_limit_retry_delay: Duration::from_millis(parsed(
                "RATE_LIMIT_RETRY_DELAY_MS",
                1000,
            )?),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
