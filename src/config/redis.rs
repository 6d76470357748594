// ABOUTME: Redis connection and retry configuration for the quota counter store
// ABOUTME: Controls connection timeouts, reconnection retries, and startup backoff
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use super::env_parse_or;

/// Redis connection and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: 5,
            response_timeout_secs: 2,
            reconnection_retries: 3,
            retry_exponent_base: 2,
            max_retry_delay_ms: 2_000,
            initial_connection_retries: 3,
            initial_retry_delay_ms: 500,
        }
    }
}

impl RedisConnectionConfig {
    /// Load Redis connection configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            connection_timeout_secs: env_parse_or(
                "REDIS_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            response_timeout_secs: env_parse_or(
                "REDIS_RESPONSE_TIMEOUT_SECS",
                defaults.response_timeout_secs,
            ),
            reconnection_retries: env_parse_or(
                "REDIS_RECONNECTION_RETRIES",
                defaults.reconnection_retries,
            ),
            retry_exponent_base: env_parse_or(
                "REDIS_RETRY_EXPONENT_BASE",
                defaults.retry_exponent_base,
            ),
            max_retry_delay_ms: env_parse_or("REDIS_MAX_RETRY_DELAY_MS", defaults.max_retry_delay_ms),
            initial_connection_retries: env_parse_or(
                "REDIS_INITIAL_CONNECTION_RETRIES",
                defaults.initial_connection_retries,
            ),
            initial_retry_delay_ms: env_parse_or(
                "REDIS_INITIAL_RETRY_DELAY_MS",
                defaults.initial_retry_delay_ms,
            ),
        }
    }
}
