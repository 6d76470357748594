// ABOUTME: Redis counter store shared by every coach instance
// ABOUTME: Atomic increment-with-expiry and guarded decrement via Lua scripts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Script};
use tracing::{error, info, warn};

use super::CounterStore;
use crate::config::RedisConnectionConfig;
use crate::errors::{AppError, AppResult};

/// INCR, then set the expiry when the key has none (first use of the window)
const INCREMENT_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// DECR only an existing, positive counter
const DECREMENT_SCRIPT: &str = r"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current > 0 then
    return redis.call('DECR', KEYS[1])
end
return 0
";

/// Redis-backed counters
#[derive(Clone)]
pub struct RedisCounterStore {
    manager: ConnectionManager,
    increment: Script,
    decrement: Script,
}

impl RedisCounterStore {
    /// Connect to Redis
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or every connection attempt fails
    pub async fn connect(redis_url: &str, conn_config: &RedisConnectionConfig) -> AppResult<Self> {
        info!(
            "Connecting to Redis counter store (timeout={}s, response_timeout={}s, retries={})",
            conn_config.connection_timeout_secs,
            conn_config.response_timeout_secs,
            conn_config.initial_connection_retries
        );

        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::config(format!("Invalid Redis URL: {e}")))?;
        let manager = Self::connect_with_retry(&client, conn_config).await?;

        info!("Connected to Redis counter store");
        Ok(Self {
            manager,
            increment: Script::new(INCREMENT_SCRIPT),
            decrement: Script::new(DECREMENT_SCRIPT),
        })
    }

    /// Connect with exponential backoff on failure
    async fn connect_with_retry(
        client: &redis::Client,
        conn_config: &RedisConnectionConfig,
    ) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(conn_config.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(conn_config.response_timeout_secs))
            .set_number_of_retries(conn_config.reconnection_retries)
            .set_exponent_base(conn_config.retry_exponent_base)
            .set_max_delay(conn_config.max_retry_delay_ms);

        let max_retries = conn_config.initial_connection_retries;
        let mut delay_ms = conn_config.initial_retry_delay_ms;
        let mut last_error: Option<redis::RedisError> = None;

        for attempt in 0..=max_retries {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    if attempt < max_retries {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            max_retries + 1,
                            delay_ms,
                            e
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(conn_config.max_retry_delay_ms);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::storage(format!(
            "Failed to connect to Redis after {} attempts: {}",
            max_retries + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }

    fn command_error(operation: &str, e: &redis::RedisError) -> AppError {
        error!("Redis {} operation failed: {}", operation, e);
        AppError::storage(format!("Counter store error: {e}"))
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let mut conn = self.manager.clone();
        self.increment
            .key(key)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Self::command_error("INCR", &e))
    }

    async fn decrement(&self, key: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: i64 = self
            .decrement
            .key(key)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Self::command_error("DECR", &e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.manager.clone();
        let value: Option<i64> = conn
            .get(key)
            .await
            .map_err(|e| Self::command_error("GET", &e))?;
        Ok(value.unwrap_or(0))
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        let mut conn = self.manager.clone();
        // -2 for a missing key, -1 for a key without expiry
        let secs: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| Self::command_error("TTL", &e))?;
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
