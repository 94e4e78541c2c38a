// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.
//!
//! Every expiry and lookback computation in the crate works in whole seconds
//! since the Unix epoch, read through a [`Clock`].

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Seconds in one day, for lookback windows.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Any epoch value at or above this is taken to be milliseconds.
/// 10^11 seconds is roughly the year 5138.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Source of "now" in Unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_unix: i64) -> Self {
        Self {
            now: AtomicI64::new(now_unix),
        }
    }

    pub fn set(&self, now_unix: i64) {
        self.now.store(now_unix, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Coerce an epoch timestamp to seconds.
///
/// Strava documents `expires_at` in seconds; a value in milliseconds would
/// otherwise make a token look valid for millennia.
pub fn normalize_epoch_seconds(value: i64) -> i64 {
    if value >= MILLIS_THRESHOLD {
        tracing::warn!(value, "Epoch timestamp looks like milliseconds, converting");
        value / 1000
    } else {
        value
    }
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
