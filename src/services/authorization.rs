// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth consent flow.

use crate::config::Config;
use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::Credential;
use crate::services::strava::StravaApi;
use crate::time_utils::format_utc_rfc3339;
use std::sync::Arc;

/// Builds the consent URL and turns the returned code into a stored credential.
#[derive(Clone)]
pub struct AuthorizationFlow {
    authorize_url: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    credentials: Arc<dyn CredentialStore>,
    strava: Arc<dyn StravaApi>,
}

impl AuthorizationFlow {
    pub fn new(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        strava: Arc<dyn StravaApi>,
    ) -> Self {
        Self {
            authorize_url: format!(
                "{}/authorize",
                config.strava_oauth_base_url.trim_end_matches('/')
            ),
            client_id: config.strava_client_id.clone(),
            redirect_uri: config.strava_redirect_uri.clone(),
            scope: config.strava_scope.clone(),
            credentials,
            strava,
        }
    }

    /// URL of the Strava consent page.
    ///
    /// `approval_prompt=force` makes Strava show the consent screen even for
    /// athletes who already granted access, so scope changes are picked up.
    pub fn build_authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&approval_prompt=force",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scope),
        )
    }

    /// Exchange the one-time code and store the initial credential.
    ///
    /// The credential is keyed by the athlete ID in Strava's token response;
    /// nothing supplied by the caller decides whose credential is written.
    /// Returns that identity.
    pub async fn complete_authorization(&self, code: &str) -> Result<String, AppError> {
        if code.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Missing authorization code".to_string(),
            ));
        }

        let exchange = self.strava.exchange_code(code).await.map_err(|e| {
            tracing::error!(error = %e, "Strava token exchange failed");
            AppError::ExchangeFailed(e.to_string())
        })?;

        let identity = exchange.athlete.id.to_string();
        let credential = Credential {
            identity: identity.clone(),
            access_token: exchange.access_token.clone(),
            refresh_token: exchange.refresh_token.clone(),
            expires_at: exchange.expires_at_secs(),
            updated_at: format_utc_rfc3339(chrono::Utc::now()),
        };
        self.credentials.upsert_credential(&credential).await?;

        tracing::info!(
            identity = %identity,
            firstname = exchange.athlete.firstname.as_deref().unwrap_or(""),
            "OAuth callback handled, credential stored"
        );

        Ok(identity)
    }
}
