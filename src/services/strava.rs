// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client.
//!
//! Handles:
//! - Authorization-code and refresh-token exchanges (form-encoded POST)
//! - Listing athlete activities (bearer GET, paginated)
//! - A single retry after a 429 rate limit response
//!
//! Errors are reported as [`ProviderError`]; each service decides which
//! [`AppError`](crate::error::AppError) variant a provider failure becomes.

use crate::config::Config;
use crate::time_utils::normalize_epoch_seconds;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure talking to Strava.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Strava answered with a non-success status; `body` is its error payload.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::Status { status: 429, .. })
    }
}

/// Calls made against the Strava API.
///
/// Implemented by [`StravaClient`]; tests substitute a scripted provider.
#[async_trait]
pub trait StravaApi: Send + Sync {
    /// Exchange a one-time authorization code for the initial tokens.
    async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, ProviderError>;

    /// Exchange a refresh token for a new token triple.
    async fn refresh_token(&self, refresh_token: &str)
        -> Result<TokenRefreshResponse, ProviderError>;

    /// List the athlete's activities, optionally only those that started
    /// after `after` (Unix seconds).
    async fn list_activities(
        &self,
        access_token: &str,
        after: Option<i64>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, ProviderError>;
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_base_url: String,
    oauth_base_url: String,
    client_id: String,
    client_secret: String,
    rate_limit_retry_delay: Duration,
}

impl StravaClient {
    /// Create a client from the OAuth application settings in `config`.
    ///
    /// Every request carries `config.http_timeout`.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_base_url: config.strava_api_base_url.trim_end_matches('/').to_string(),
            oauth_base_url: config.strava_oauth_base_url.trim_end_matches('/').to_string(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
            rate_limit_retry_delay: config.rate_limit_retry_delay,
        })
    }

    fn token_url(&self) -> String {
        format!("{}/token", self.oauth_base_url)
    }

    /// Send a request, repeating it once if Strava answers 429.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, ProviderError>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let response = build()
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        tracing::warn!(
            delay_ms = self.rate_limit_retry_delay.as_millis() as u64,
            "Strava rate limit hit (429), retrying once"
        );
        tokio::time::sleep(self.rate_limit_retry_delay).await;

        build()
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StravaApi for StravaClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, ProviderError> {
        let url = self.token_url();
        let response = self
            .send(|| {
                self.http.post(&url).form(&[
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("code", code),
                    ("grant_type", "authorization_code"),
                ])
            })
            .await?;

        Self::check_response_json(response).await
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, ProviderError> {
        let url = self.token_url();
        let response = self
            .send(|| {
                self.http.post(&url).form(&[
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("refresh_token", refresh_token),
                    ("grant_type", "refresh_token"),
                ])
            })
            .await?;

        Self::check_response_json(response).await
    }

    async fn list_activities(
        &self,
        access_token: &str,
        after: Option<i64>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, ProviderError> {
        let url = format!("{}/athlete/activities", self.api_base_url);
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let response = self
            .send(|| self.http.get(&url).bearer_auth(access_token).query(&query))
            .await?;

        Self::check_response_json(response).await
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl TokenRefreshResponse {
    /// `expires_at` in Unix seconds.
    pub fn expires_at_secs(&self) -> i64 {
        normalize_epoch_seconds(self.expires_at)
    }
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub athlete: StravaAthlete,
}

impl TokenExchangeResponse {
    /// `expires_at` in Unix seconds.
    pub fn expires_at_secs(&self) -> i64 {
        normalize_epoch_seconds(self.expires_at)
    }
}

/// Athlete info from OAuth token exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Summary activity from the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StravaActivitySummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: i64,
    #[serde(default)]
    pub elapsed_time: i64,
    #[serde(default)]
    pub start_date: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
}
