// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No credential stored for the identity; authorization must be re-run.
    #[error("Not authorized: no credential for {0}")]
    NotAuthorized(String),

    /// Provider rejected the refresh-token exchange.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Provider rejected the authorization-code exchange.
    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    /// Activities fetch failed after a valid token was obtained.
    #[error("Activity sync failed: {0}")]
    SyncFailed(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the user has to go through the consent flow again.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(self, AppError::NotAuthorized(_) | AppError::RefreshFailed(_))
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::SyncFailed(_))
    }
}

/// Where a client restarts the consent flow.
pub const REAUTHORIZE_PATH: &str = "/auth/strava";

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    /// Set when the athlete has to connect Strava again.
    #[serde(skip_serializing_if = "Option::is_none")]
    reauthorize: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let reauthorize = self.requires_reauthorization().then_some(REAUTHORIZE_PATH);
        let retryable = self.is_retryable();

        let (status, error, details) = match &self {
            AppError::NotAuthorized(identity) => (
                StatusCode::UNAUTHORIZED,
                "not_authorized",
                Some(format!("No Strava authorization for {}", identity)),
            ),
            AppError::RefreshFailed(msg) => {
                tracing::warn!(error = %msg, "Token refresh rejected by Strava");
                (StatusCode::UNAUTHORIZED, "refresh_failed", Some(msg.clone()))
            }
            AppError::ExchangeFailed(msg) => {
                tracing::warn!(error = %msg, "Authorization code exchange failed");
                (StatusCode::BAD_GATEWAY, "exchange_failed", Some(msg.clone()))
            }
            AppError::SyncFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "sync_failed", Some(msg.clone()))
            }
            AppError::StorageUnavailable(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            reauthorize,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
