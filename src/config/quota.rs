// ABOUTME: Quota ceilings per window and the policy applied when the counter store fails
// ABOUTME: Loaded from COACH_* environment variables with conservative defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::env_parse_or;
use crate::constants::quota;
use crate::errors::{AppError, AppResult};

/// What admission does when the counter store cannot be reached
///
/// `FailOpen` favours availability: an outage of the counter store admits
/// every request (with a warning) instead of blocking legitimate traffic.
/// `FailClosed` rejects requests until the store recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Admit the request when the counter store errors
    #[default]
    FailOpen,
    /// Reject the request when the counter store errors
    FailClosed,
}

impl FromStr for StoreFailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            other => Err(AppError::config(format!(
                "Unknown quota failure policy '{other}' (expected fail_open or fail_closed)"
            ))),
        }
    }
}

impl fmt::Display for StoreFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailOpen => f.write_str("fail_open"),
            Self::FailClosed => f.write_str("fail_closed"),
        }
    }
}

/// Quota configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Requests per day across all users
    pub global_daily_limit: u32,
    /// Requests per hour per user
    pub user_hourly_limit: u32,
    /// Requests per day per user
    pub user_daily_limit: u32,
    /// Extra lifetime for day-window counters beyond 24 hours
    pub day_margin_secs: u64,
    /// Behaviour when the counter store errors
    pub failure_policy: StoreFailurePolicy,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            global_daily_limit: quota::DEFAULT_GLOBAL_DAILY_LIMIT,
            user_hourly_limit: quota::DEFAULT_USER_HOURLY_LIMIT,
            user_daily_limit: quota::DEFAULT_USER_DAILY_LIMIT,
            day_margin_secs: quota::DEFAULT_DAY_MARGIN_SECS,
            failure_policy: StoreFailurePolicy::FailOpen,
        }
    }
}

impl QuotaConfig {
    /// Load quota configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if `COACH_QUOTA_FAILURE_POLICY` holds an unknown value
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        let failure_policy = match env::var("COACH_QUOTA_FAILURE_POLICY") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => defaults.failure_policy,
        };

        Ok(Self {
            global_daily_limit: env_parse_or("COACH_GLOBAL_DAILY_LIMIT", defaults.global_daily_limit),
            user_hourly_limit: env_parse_or("COACH_USER_HOURLY_LIMIT", defaults.user_hourly_limit),
            user_daily_limit: env_parse_or("COACH_USER_DAILY_LIMIT", defaults.user_daily_limit),
            day_margin_secs: env_parse_or("COACH_QUOTA_DAY_MARGIN_SECS", defaults.day_margin_secs),
            failure_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!(
            "fail_open".parse::<StoreFailurePolicy>().unwrap(),
            StoreFailurePolicy::FailOpen
        );
        assert_eq!(
            "Fail-Closed".parse::<StoreFailurePolicy>().unwrap(),
            StoreFailurePolicy::FailClosed
        );
        assert!("sometimes".parse::<StoreFailurePolicy>().is_err());
    }
}
