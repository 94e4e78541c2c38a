// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod authorization;
pub mod strava;
pub mod sync;
pub mod token;

pub use authorization::AuthorizationFlow;
pub use strava::{ProviderError, StravaApi, StravaClient};
pub use sync::{ActivitySyncer, SyncResult};
pub use token::TokenRefresher;
