// ABOUTME: Configuration management module for the coach service
// ABOUTME: Loads storage, LLM backend, quota, and Redis settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration for the Korsana coach
//!
//! All configuration comes from environment variables and is loaded once
//! into [`ServerConfig`]:
//!
//! - **LLM**: backend credentials, models, endpoints, timeout
//! - **Quota**: ceilings per window and the counter-store failure policy
//! - **Redis**: connection and retry tunables for the counter store

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppResult;

/// LLM backend configuration
pub mod llm;
/// Quota ceilings and failure policy
pub mod quota;
/// Redis connection configuration
pub mod redis;

pub use llm::{LlmConfig, LlmProviderType};
pub use quota::{QuotaConfig, StoreFailurePolicy};
pub use redis::RedisConnectionConfig;

/// Default `SQLite` database URL
pub const DEFAULT_DATABASE_URL: &str = "sqlite:korsana.db";

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Whether this is a production deployment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// SQL database URL
    pub database_url: String,
    /// Redis URL for the quota counter store; in-memory counters when absent
    pub redis_url: Option<String>,
    /// Redis connection tunables
    pub redis: RedisConnectionConfig,
    /// LLM backend configuration
    pub llm: LlmConfig,
    /// Quota configuration
    pub quota: QuotaConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but malformed (for example an
    /// unknown quota failure policy)
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            database_url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            redis: RedisConnectionConfig::from_env(),
            llm: LlmConfig::from_env(),
            quota: QuotaConfig::from_env()?,
        };
        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        info!(
            environment = ?self.environment,
            database_url = %self.database_url,
            counter_store = if self.redis_url.is_some() { "redis" } else { "memory" },
            llm_backend = ?self.llm.preferred_provider(),
            global_daily_limit = self.quota.global_daily_limit,
            user_hourly_limit = self.quota.user_hourly_limit,
            user_daily_limit = self.quota.user_daily_limit,
            failure_policy = ?self.quota.failure_policy,
            "Configuration loaded"
        );
    }
}

/// Read an environment variable or fall back to a default
pub(crate) fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to a default when unset or malformed
pub(crate) fn env_parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a non-empty environment variable
pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
