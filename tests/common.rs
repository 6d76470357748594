// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory databases, scripted LLM providers, failing stores, and seed data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_possible_truncation
)]
//! Shared test utilities for `korsana_coach`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use korsana_coach::config::{QuotaConfig, StoreFailurePolicy};
use korsana_coach::context::ContextBuilder;
use korsana_coach::database::Database;
use korsana_coach::errors::{AppError, AppResult};
use korsana_coach::llm::{ChatRequest, ChatResponse, LlmProvider};
use korsana_coach::models::{Activity, GoalType, RaceGoal, WeeklySummary};
use korsana_coach::quota::{CounterStore, InMemoryCounterStore, QuotaEnforcer};
use korsana_coach::services::CoachService;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fresh in-memory database with the schema in place
pub async fn create_test_database() -> Database {
    init_test_logging();
    Database::in_memory().await.expect("in-memory database")
}

// ============================================================================
// LLM doubles
// ============================================================================

/// Provider that replays queued replies and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<AppResult<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies(replies: &[&str]) -> Arc<Self> {
        let provider = Self::default();
        for reply in replies {
            provider.push_reply((*reply).to_owned());
        }
        Arc::new(provider)
    }

    pub fn push_reply(&self, reply: String) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn push_error(&self, error: AppError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted Test Provider"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Keep it easy today.".to_owned()))?;
        Ok(ChatResponse {
            content: reply,
            model: "scripted-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }
}

// ============================================================================
// Counter store doubles
// ============================================================================

/// Counter store whose every operation fails
pub struct UnavailableCounterStore;

#[async_trait]
impl CounterStore for UnavailableCounterStore {
    async fn increment(&self, _key: &str, _ttl: Duration) -> AppResult<i64> {
        Err(AppError::storage("connection refused"))
    }

    async fn decrement(&self, _key: &str) -> AppResult<()> {
        Err(AppError::storage("connection refused"))
    }

    async fn get(&self, _key: &str) -> AppResult<i64> {
        Err(AppError::storage("connection refused"))
    }

    async fn ttl(&self, _key: &str) -> AppResult<Option<Duration>> {
        Err(AppError::storage("connection refused"))
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Counter store that works until the key matching `fail_on` is incremented
pub struct FlakyCounterStore {
    pub inner: InMemoryCounterStore,
    pub fail_on: String,
}

#[async_trait]
impl CounterStore for FlakyCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        if key.contains(&self.fail_on) {
            return Err(AppError::storage("connection reset"));
        }
        self.inner.increment(key, ttl).await
    }

    async fn decrement(&self, key: &str) -> AppResult<()> {
        self.inner.decrement(key).await
    }

    async fn get(&self, key: &str) -> AppResult<i64> {
        self.inner.get(key).await
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        self.inner.ttl(key).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub fn quota_config(global: u32, hourly: u32, daily: u32) -> QuotaConfig {
    QuotaConfig {
        global_daily_limit: global,
        user_hourly_limit: hourly,
        user_daily_limit: daily,
        day_margin_secs: 3600,
        failure_policy: StoreFailurePolicy::FailOpen,
    }
}

pub fn memory_enforcer(config: QuotaConfig) -> (QuotaEnforcer, Arc<InMemoryCounterStore>) {
    let store = Arc::new(InMemoryCounterStore::new());
    let enforcer = QuotaEnforcer::new(store.clone(), config);
    (enforcer, store)
}

/// Coach service over an in-memory database and in-memory counters
pub fn coach_service(
    database: &Database,
    provider: Option<Arc<dyn LlmProvider>>,
    quota: QuotaEnforcer,
) -> CoachService {
    let calendar = Arc::new(database.calendar());
    CoachService::new(
        provider,
        quota,
        ContextBuilder::new(Arc::new(database.training()), calendar.clone()),
        Arc::new(database.conversations()),
        calendar,
    )
}

// ============================================================================
// Seed data
// ============================================================================

pub fn race_goal(user_id: Uuid, race_date: NaiveDate, target: Option<i64>) -> RaceGoal {
    RaceGoal {
        id: Uuid::new_v4(),
        user_id,
        race_name: "City Marathon".to_owned(),
        race_date,
        race_distance_meters: 42_195,
        target_time_seconds: target,
        goal_type: if target.is_some() {
            GoalType::Time
        } else {
            GoalType::Finish
        },
        is_active: true,
    }
}

pub fn activity(
    user_id: Uuid,
    start_time: DateTime<Utc>,
    meters: f64,
    seconds: i64,
) -> Activity {
    Activity {
        id: Uuid::new_v4(),
        user_id,
        source: "manual".to_owned(),
        name: "Run".to_owned(),
        distance_meters: meters,
        duration_seconds: seconds,
        start_time,
    }
}

pub fn weekly_summary(user_id: Uuid, week_start: NaiveDate, km: f64, runs: i64) -> WeeklySummary {
    WeeklySummary {
        user_id,
        week_start,
        total_distance_meters: km * 1000.0,
        total_duration_seconds: (km * 330.0) as i64,
        run_count: runs,
        average_pace_seconds_per_km: 330.0,
        longest_run_meters: Some(km * 300.0),
    }
}

/// A valid plan reply covering `days` consecutive days from `first`
pub fn plan_json(first: NaiveDate, days: u32) -> String {
    let entries: Vec<serde_json::Value> = (0..i64::from(days))
        .map(|offset| {
            let date = first + chrono::Duration::days(offset);
            let rest = offset % 7 == 6;
            serde_json::json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "workout_type": if rest { "rest" } else { "easy" },
                "title": if rest { "Rest Day" } else { "Easy Run" },
                "description": "Conversational effort",
                "distance_km": if rest { 0.0 } else { 8.0 },
                "pace_per_km": if rest { 0 } else { 360 },
            })
        })
        .collect();
    serde_json::json!({ "plan": entries, "summary": "A steady base week." }).to_string()
}
