// ABOUTME: In-process counter store for single-instance deployments and tests
// ABOUTME: Per-key atomic updates through DashMap entries with lazy expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::CounterStore;
use crate::constants::quota::MEMORY_PURGE_INTERVAL;
use crate::errors::AppResult;

/// Counter value with its expiry instant
#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: i64,
    expires_at: Instant,
}

impl CounterEntry {
    fn new(ttl: Duration) -> Self {
        Self {
            count: 0,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}

/// `DashMap`-backed counters
///
/// Each operation holds the shard lock for its key, so increment-and-read is
/// atomic per key. Expired entries read as zero, are replaced on the next
/// increment of their key, and are swept from the map every
/// `MEMORY_PURGE_INTERVAL` increments so dated window keys do not accumulate.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: DashMap<String, CounterEntry>,
    increments: AtomicU64,
}

impl InMemoryCounterStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries
    pub fn purge_expired(&self) {
        self.counters.retain(|_, entry| !entry.is_expired());
    }

    /// Number of stored keys, expired or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no keys are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        // Sweep before taking the entry guard; retain locks every shard
        let previous = self.increments.fetch_add(1, Ordering::Relaxed);
        if previous % MEMORY_PURGE_INTERVAL == MEMORY_PURGE_INTERVAL - 1 {
            self.purge_expired();
        }

        let mut entry = self
            .counters
            .entry(key.to_owned())
            .or_insert_with(|| CounterEntry::new(ttl));
        if entry.is_expired() {
            *entry = CounterEntry::new(ttl);
        }
        entry.count += 1;
        Ok(entry.count)
    }

    async fn decrement(&self, key: &str) -> AppResult<()> {
        if let Some(mut entry) = self.counters.get_mut(key) {
            if !entry.is_expired() && entry.count > 0 {
                entry.count -= 1;
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<i64> {
        Ok(self
            .counters
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map_or(0, |entry| entry.count))
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        Ok(self
            .counters
            .get(key)
            .and_then(|entry| entry.remaining_ttl()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decrement_never_creates_or_goes_negative() {
        let store = InMemoryCounterStore::new();
        store.decrement("missing").await.unwrap();
        assert_eq!(store.get("missing").await.unwrap(), 0);
        assert!(store.ttl("missing").await.unwrap().is_none());

        store.increment("k", Duration::from_secs(60)).await.unwrap();
        store.decrement("k").await.unwrap();
        store.decrement("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_counter_restarts() {
        let store = InMemoryCounterStore::new();
        store.increment("k", Duration::ZERO).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), 0);
        assert_eq!(
            store.increment("k", Duration::from_secs(60)).await.unwrap(),
            1
        );
        store.purge_expired();
        assert_eq!(store.get("k").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_increments_sweep_expired_keys() {
        let store = InMemoryCounterStore::new();
        for day in 0..MEMORY_PURGE_INTERVAL - 1 {
            store
                .increment(&format!("korsana:quota:global:{day}"), Duration::ZERO)
                .await
                .unwrap();
        }
        assert_eq!(store.len(), usize::try_from(MEMORY_PURGE_INTERVAL - 1).unwrap());

        store.increment("live", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("live").await.unwrap(), 1);
    }
}
