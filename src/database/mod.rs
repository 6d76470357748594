// ABOUTME: Database layer: collaborator traits for training data, calendar, and conversations
// ABOUTME: SQLite implementations share one pool owned by the Database wrapper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! The coach consumes three collaborators through traits so the core never
//! depends on a concrete store:
//!
//! - [`TrainingDataStore`]: read-only goal, activity, and weekly aggregate queries
//! - [`CalendarStore`]: upcoming entries plus create-or-replace by (user, date)
//! - [`ConversationStore`]: append-only turn log read back chronologically
//!
//! [`Database`] owns a `SQLite` pool and hands out the `sqlx` managers that
//! implement them. `bootstrap_schema` creates missing tables; versioned
//! migrations are not part of this crate.

mod calendar;
mod conversations;
mod training;

pub use calendar::CalendarManager;
pub use conversations::ConversationManager;
pub use training::TrainingManager;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;
use crate::models::{
    Activity, CalendarEntry, ConversationTurn, NewCalendarEntry, RaceGoal, WeeklySummary,
};

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Read-only queries over a runner's training history
#[async_trait]
pub trait TrainingDataStore: Send + Sync {
    /// The user's single active race goal, if any
    async fn active_goal(&self, user_id: Uuid) -> AppResult<Option<RaceGoal>>;

    /// Activities that started at or after `since`, newest first
    async fn recent_activities(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<Activity>>;

    /// Up to `limit` weekly summaries, newest week first
    async fn recent_weekly_summaries(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<WeeklySummary>>;

    /// Longest single activity distance in meters since `since` (0 when none)
    async fn longest_recent_distance(&self, user_id: Uuid, since: DateTime<Utc>)
        -> AppResult<f64>;
}

/// The calendar collaborator
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Entries dated `from` through `from + days - 1`, in date order
    async fn upcoming_entries(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        days: u32,
    ) -> AppResult<Vec<CalendarEntry>>;

    /// Create or replace the user's entry for `entry.date`
    async fn upsert_entry(&self, user_id: Uuid, entry: NewCalendarEntry)
        -> AppResult<CalendarEntry>;
}

/// Append-only conversation log
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one turn
    async fn append(
        &self,
        user_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> AppResult<ConversationTurn>;

    /// The most recent `limit` turns in chronological order
    async fn recent(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<ConversationTurn>>;
}

// ============================================================================
// SQLite Database
// ============================================================================

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS race_goals (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        race_name TEXT NOT NULL,
        race_date TEXT NOT NULL,
        race_distance_meters INTEGER NOT NULL,
        target_time_seconds INTEGER,
        goal_type TEXT NOT NULL DEFAULT 'finish',
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_race_goals_user_active ON race_goals(user_id, is_active)",
    r"
    CREATE TABLE IF NOT EXISTS activities (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        source TEXT NOT NULL DEFAULT 'manual',
        name TEXT NOT NULL DEFAULT '',
        distance_meters REAL NOT NULL,
        duration_seconds INTEGER NOT NULL,
        start_time TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_activities_user_start ON activities(user_id, start_time)",
    r"
    CREATE TABLE IF NOT EXISTS weekly_summaries (
        user_id TEXT NOT NULL,
        week_start TEXT NOT NULL,
        total_distance_meters REAL NOT NULL,
        total_duration_seconds INTEGER NOT NULL,
        run_count INTEGER NOT NULL,
        average_pace_seconds_per_km REAL NOT NULL,
        longest_run_meters REAL,
        PRIMARY KEY (user_id, week_start)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS calendar_entries (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        date TEXT NOT NULL,
        workout_type TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        planned_distance_meters INTEGER,
        planned_pace_per_km INTEGER,
        status TEXT NOT NULL DEFAULT 'planned',
        source TEXT NOT NULL DEFAULT 'manual',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, date)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS coach_conversations (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_coach_conversations_user_created ON coach_conversations(user_id, created_at)",
];

/// Owner of the `SQLite` pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to a database URL, creating the file if needed
    ///
    /// In-memory databases are limited to a single connection so every query
    /// sees the same database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        info!(in_memory, "Database connection established");
        Ok(Self { pool })
    }

    /// Connect to a fresh in-memory database with the schema in place
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema creation fails
    pub async fn in_memory() -> AppResult<Self> {
        let database = Self::connect("sqlite::memory:").await?;
        database.bootstrap_schema().await?;
        Ok(database)
    }

    /// Create any missing tables and indexes
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails
    pub async fn bootstrap_schema(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to create schema: {e}")))?;
        }
        Ok(())
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Training data queries
    #[must_use]
    pub fn training(&self) -> TrainingManager {
        TrainingManager::new(self.pool.clone())
    }

    /// Calendar operations
    #[must_use]
    pub fn calendar(&self) -> CalendarManager {
        CalendarManager::new(self.pool.clone())
    }

    /// Conversation log
    #[must_use]
    pub fn conversations(&self) -> ConversationManager {
        ConversationManager::new(self.pool.clone())
    }
}

// ============================================================================
// Column Encoding
// ============================================================================

/// Fixed-width UTC timestamp so text ordering matches time ordering
pub(crate) fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp '{value}': {e}")))
}

pub(crate) fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn decode_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::database(format!("Invalid date '{value}': {e}")))
}

pub(crate) fn decode_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::database(format!("Invalid id '{value}': {e}")))
}
