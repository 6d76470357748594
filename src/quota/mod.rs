// ABOUTME: Multi-window quota enforcement for the coach's advice-generation calls
// ABOUTME: Checks global-daily, user-hourly, and user-daily counters with all-or-nothing admission
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Quota Enforcer
//!
//! Every generation request passes [`QuotaEnforcer::admit`] first. Three
//! counters are checked in a fixed order:
//!
//! 1. global per UTC day
//! 2. per user per rolling hour (the window starts at the user's first request)
//! 3. per user per UTC day
//!
//! Each check is a single atomic increment followed by a local comparison
//! against the ceiling. When a check fails, every counter incremented earlier
//! in the same attempt is decremented again before the denial is returned, so
//! a denied request leaves no trace. Consumption is charged at admission:
//! a generation that later fails keeps its quota.
//!
//! When the counter store itself errors, the configured
//! [`StoreFailurePolicy`] decides: `FailOpen` admits the request unmetered,
//! `FailClosed` rejects it.

/// In-process counter store
pub mod memory;
/// Redis counter store
pub mod redis;

pub use memory::InMemoryCounterStore;
pub use redis::RedisCounterStore;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{QuotaConfig, StoreFailurePolicy};
use crate::constants::quota::{DAY_WINDOW_SECS, HOUR_WINDOW_SECS, KEY_PREFIX};
use crate::errors::{AppError, AppResult, ErrorCode};

// ============================================================================
// Counter Store
// ============================================================================

/// Atomic, expiring counters shared by every request handler
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add one and return the new value
    ///
    /// When the increment creates the key, the key expires after `ttl`.
    async fn increment(&self, key: &str, ttl: Duration) -> AppResult<i64>;

    /// Subtract one; never creates a key and never goes below zero
    async fn decrement(&self, key: &str) -> AppResult<()>;

    /// Current value (0 when missing or expired)
    async fn get(&self, key: &str) -> AppResult<i64>;

    /// Remaining lifetime, `None` when the key is missing or has no expiry
    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>>;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// Windows and Decisions
// ============================================================================

/// Which counter a window belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaScope {
    /// All users, per UTC day
    GlobalDaily,
    /// One user, per rolling hour
    UserHourly,
    /// One user, per UTC day
    UserDaily,
}

impl QuotaScope {
    /// Fixed check order
    pub const ORDER: [Self; 3] = [Self::GlobalDaily, Self::UserHourly, Self::UserDaily];

    /// Identifier used in error details and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlobalDaily => "global_daily",
            Self::UserHourly => "user_hourly",
            Self::UserDaily => "user_daily",
        }
    }
}

impl fmt::Display for QuotaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One counter checked during admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaWindow {
    /// Which counter
    pub scope: QuotaScope,
    /// Counter key in the store
    pub key: String,
    /// Ceiling for the window
    pub limit: u32,
    /// Lifetime set when the counter is created
    pub ttl: Duration,
}

/// Why a request was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDenial {
    /// Counter that triggered the denial
    pub scope: QuotaScope,
    /// Its ceiling
    pub limit: u32,
    /// Minutes until the caller can expect to be admitted again
    pub retry_after_minutes: u64,
    /// User-facing explanation
    pub message: String,
}

impl From<QuotaDenial> for AppError {
    fn from(denial: QuotaDenial) -> Self {
        Self::quota_exceeded(
            denial.scope.as_str(),
            denial.retry_after_minutes,
            denial.message,
        )
    }
}

/// Result of an admission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Counted against every window
    Allowed,
    /// Admitted without metering because the counter store failed (fail-open)
    Unmetered,
    /// Refused; no counter was left incremented
    Denied(QuotaDenial),
}

impl Admission {
    /// Whether the request may proceed
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }
}

/// Current counter values for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    /// Requests today across all users
    pub global_daily_used: i64,
    /// Global daily ceiling
    pub global_daily_limit: u32,
    /// Requests in the user's current hour window
    pub user_hourly_used: i64,
    /// Hourly ceiling
    pub user_hourly_limit: u32,
    /// Requests by the user today
    pub user_daily_used: i64,
    /// Daily ceiling
    pub user_daily_limit: u32,
}

// ============================================================================
// Enforcer
// ============================================================================

/// Multi-window quota enforcer
#[derive(Clone)]
pub struct QuotaEnforcer {
    store: Arc<dyn CounterStore>,
    config: QuotaConfig,
}

impl QuotaEnforcer {
    /// Create an enforcer over a counter store
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, config: QuotaConfig) -> Self {
        info!(
            backend = store.backend_name(),
            policy = %config.failure_policy,
            "Quota enforcer ready"
        );
        Self { store, config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Counter key for a scope at an instant
    #[must_use]
    pub fn window_key(scope: QuotaScope, user_id: Uuid, now: DateTime<Utc>) -> String {
        let day = now.format("%Y-%m-%d");
        match scope {
            QuotaScope::GlobalDaily => format!("{KEY_PREFIX}:global:{day}"),
            QuotaScope::UserHourly => format!("{KEY_PREFIX}:user:{user_id}:hour"),
            QuotaScope::UserDaily => format!("{KEY_PREFIX}:user:{user_id}:day:{day}"),
        }
    }

    /// The three windows checked for a user, in check order
    #[must_use]
    pub fn windows(&self, user_id: Uuid, now: DateTime<Utc>) -> Vec<QuotaWindow> {
        let day_ttl = Duration::from_secs(DAY_WINDOW_SECS + self.config.day_margin_secs);
        QuotaScope::ORDER
            .into_iter()
            .map(|scope| {
                let (limit, ttl) = match scope {
                    QuotaScope::GlobalDaily => (self.config.global_daily_limit, day_ttl),
                    QuotaScope::UserHourly => (
                        self.config.user_hourly_limit,
                        Duration::from_secs(HOUR_WINDOW_SECS),
                    ),
                    QuotaScope::UserDaily => (self.config.user_daily_limit, day_ttl),
                };
                QuotaWindow {
                    scope,
                    key: Self::window_key(scope, user_id, now),
                    limit,
                    ttl,
                }
            })
            .collect()
    }

    /// Decide whether a user may make one more generation request
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceUnavailable` only when the counter store fails
    /// and the policy is `FailClosed`
    pub async fn admit(&self, user_id: Uuid) -> AppResult<Admission> {
        self.admit_at(user_id, Utc::now()).await
    }

    /// [`Self::admit`] at a fixed instant
    ///
    /// # Errors
    ///
    /// See [`Self::admit`]
    pub async fn admit_at(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Admission> {
        let windows = self.windows(user_id, now);
        let mut incremented: Vec<&QuotaWindow> = Vec::with_capacity(windows.len());

        for window in &windows {
            let count = match self.store.increment(&window.key, window.ttl).await {
                Ok(count) => count,
                Err(error) => return self.on_store_failure(&incremented, window, &error).await,
            };
            incremented.push(window);

            if count > i64::from(window.limit) {
                warn!(
                    user_id = %user_id,
                    scope = %window.scope,
                    count,
                    limit = window.limit,
                    "Coach quota exceeded"
                );
                self.rollback(&incremented).await;
                let retry_after_minutes = self.retry_after_minutes(window, now).await;
                return Ok(Admission::Denied(QuotaDenial {
                    scope: window.scope,
                    limit: window.limit,
                    retry_after_minutes,
                    message: denial_message(window.scope, window.limit, retry_after_minutes),
                }));
            }
        }

        debug!(user_id = %user_id, "Coach request admitted");
        Ok(Admission::Allowed)
    }

    /// Admit or convert the denial into a `QuotaExceeded` error
    ///
    /// # Errors
    ///
    /// Returns `QuotaExceeded` on denial, or the store error under `FailClosed`
    pub async fn enforce(&self, user_id: Uuid) -> AppResult<()> {
        match self.admit(user_id).await? {
            Admission::Allowed | Admission::Unmetered => Ok(()),
            Admission::Denied(denial) => Err(denial.into()),
        }
    }

    /// Current counter values for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the counter store cannot be read
    pub async fn usage(&self, user_id: Uuid) -> AppResult<QuotaUsage> {
        let now = Utc::now();
        let get = |scope| {
            let key = Self::window_key(scope, user_id, now);
            async move { self.store.get(&key).await }
        };
        Ok(QuotaUsage {
            global_daily_used: get(QuotaScope::GlobalDaily).await?,
            global_daily_limit: self.config.global_daily_limit,
            user_hourly_used: get(QuotaScope::UserHourly).await?,
            user_hourly_limit: self.config.user_hourly_limit,
            user_daily_used: get(QuotaScope::UserDaily).await?,
            user_daily_limit: self.config.user_daily_limit,
        })
    }

    async fn on_store_failure(
        &self,
        incremented: &[&QuotaWindow],
        window: &QuotaWindow,
        error: &AppError,
    ) -> AppResult<Admission> {
        match self.config.failure_policy {
            StoreFailurePolicy::FailOpen => {
                warn!(
                    scope = %window.scope,
                    error = %error,
                    "Counter store unavailable; admitting request unmetered"
                );
                Ok(Admission::Unmetered)
            }
            StoreFailurePolicy::FailClosed => {
                warn!(
                    scope = %window.scope,
                    error = %error,
                    "Counter store unavailable; rejecting request"
                );
                self.rollback(incremented).await;
                Err(AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    "The AI coach is temporarily unavailable. Please try again shortly.",
                ))
            }
        }
    }

    /// Undo increments from this attempt, newest first
    async fn rollback(&self, incremented: &[&QuotaWindow]) {
        for window in incremented.iter().rev() {
            if let Err(error) = self.store.decrement(&window.key).await {
                warn!(scope = %window.scope, error = %error, "Failed to roll back quota counter");
            }
        }
    }

    /// Minutes until the triggering window resets
    async fn retry_after_minutes(&self, window: &QuotaWindow, now: DateTime<Utc>) -> u64 {
        match window.scope {
            QuotaScope::UserHourly => {
                let remaining = self
                    .store
                    .ttl(&window.key)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or(window.ttl);
                remaining.as_secs() / 60 + 1
            }
            QuotaScope::GlobalDaily | QuotaScope::UserDaily => minutes_until_next_utc_day(now),
        }
    }
}

/// Minutes from `now` until the next UTC midnight, rounded up
fn minutes_until_next_utc_day(now: DateTime<Utc>) -> u64 {
    let next_midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());
    next_midnight.map_or(DAY_WINDOW_SECS / 60, |midnight| {
        let secs = u64::try_from((midnight - now).num_seconds()).unwrap_or(0);
        secs.div_ceil(60)
    })
}

fn denial_message(scope: QuotaScope, limit: u32, retry_after_minutes: u64) -> String {
    match scope {
        QuotaScope::GlobalDaily => {
            "The AI coach has reached its daily limit. Please try again tomorrow.".to_owned()
        }
        QuotaScope::UserHourly => format!(
            "You've reached the hourly message limit. Try again in {retry_after_minutes} minutes."
        ),
        QuotaScope::UserDaily => {
            format!("You've reached the daily message limit ({limit}). Try again tomorrow.")
        }
    }
}
