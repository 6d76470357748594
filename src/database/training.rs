// ABOUTME: SQLite training data store: race goals, activities, and weekly summaries
// ABOUTME: Read queries feed the context builder; write helpers record synced data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{decode_date, decode_timestamp, decode_uuid, encode_date, encode_timestamp, TrainingDataStore};
use crate::errors::{AppError, AppResult};
use crate::models::{Activity, GoalType, RaceGoal, WeeklySummary};

/// Training data operations manager
#[derive(Clone)]
pub struct TrainingManager {
    pool: SqlitePool,
}

impl TrainingManager {
    /// Create a new training manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a race goal; an active goal deactivates the user's other goals
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn save_goal(&self, goal: &RaceGoal) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if goal.is_active {
            sqlx::query("UPDATE race_goals SET is_active = 0 WHERE user_id = $1 AND id != $2")
                .bind(goal.user_id.to_string())
                .bind(goal.id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r"
            INSERT INTO race_goals (id, user_id, race_name, race_date, race_distance_meters,
                                    target_time_seconds, goal_type, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(id) DO UPDATE SET
                race_name = excluded.race_name,
                race_date = excluded.race_date,
                race_distance_meters = excluded.race_distance_meters,
                target_time_seconds = excluded.target_time_seconds,
                goal_type = excluded.goal_type,
                is_active = excluded.is_active
            ",
        )
        .bind(goal.id.to_string())
        .bind(goal.user_id.to_string())
        .bind(&goal.race_name)
        .bind(encode_date(goal.race_date))
        .bind(goal.race_distance_meters)
        .bind(goal.target_time_seconds)
        .bind(goal.goal_type.as_str())
        .bind(goal.is_active)
        .bind(encode_timestamp(Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to save race goal: {e}")))?;

        tx.commit().await?;
        Ok(())
    }

    /// Record a completed activity (replaces an existing row with the same id)
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn record_activity(&self, activity: &Activity) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT OR REPLACE INTO activities (id, user_id, source, name, distance_meters,
                                               duration_seconds, start_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(activity.id.to_string())
        .bind(activity.user_id.to_string())
        .bind(&activity.source)
        .bind(&activity.name)
        .bind(activity.distance_meters)
        .bind(activity.duration_seconds)
        .bind(encode_timestamp(activity.start_time))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record activity: {e}")))?;
        Ok(())
    }

    /// Store or replace a weekly summary
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn upsert_weekly_summary(&self, summary: &WeeklySummary) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT OR REPLACE INTO weekly_summaries (user_id, week_start, total_distance_meters,
                total_duration_seconds, run_count, average_pace_seconds_per_km, longest_run_meters)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(summary.user_id.to_string())
        .bind(encode_date(summary.week_start))
        .bind(summary.total_distance_meters)
        .bind(summary.total_duration_seconds)
        .bind(summary.run_count)
        .bind(summary.average_pace_seconds_per_km)
        .bind(summary.longest_run_meters)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store weekly summary: {e}")))?;
        Ok(())
    }

    fn goal_from_row(row: &SqliteRow) -> AppResult<RaceGoal> {
        Ok(RaceGoal {
            id: decode_uuid(&row.try_get::<String, _>("id")?)?,
            user_id: decode_uuid(&row.try_get::<String, _>("user_id")?)?,
            race_name: row.try_get("race_name")?,
            race_date: decode_date(&row.try_get::<String, _>("race_date")?)?,
            race_distance_meters: row.try_get("race_distance_meters")?,
            target_time_seconds: row.try_get("target_time_seconds")?,
            goal_type: GoalType::from_str_or_default(&row.try_get::<String, _>("goal_type")?),
            is_active: row.try_get("is_active")?,
        })
    }

    fn activity_from_row(row: &SqliteRow) -> AppResult<Activity> {
        Ok(Activity {
            id: decode_uuid(&row.try_get::<String, _>("id")?)?,
            user_id: decode_uuid(&row.try_get::<String, _>("user_id")?)?,
            source: row.try_get("source")?,
            name: row.try_get("name")?,
            distance_meters: row.try_get("distance_meters")?,
            duration_seconds: row.try_get("duration_seconds")?,
            start_time: decode_timestamp(&row.try_get::<String, _>("start_time")?)?,
        })
    }

    fn summary_from_row(row: &SqliteRow) -> AppResult<WeeklySummary> {
        Ok(WeeklySummary {
            user_id: decode_uuid(&row.try_get::<String, _>("user_id")?)?,
            week_start: decode_date(&row.try_get::<String, _>("week_start")?)?,
            total_distance_meters: row.try_get("total_distance_meters")?,
            total_duration_seconds: row.try_get("total_duration_seconds")?,
            run_count: row.try_get("run_count")?,
            average_pace_seconds_per_km: row.try_get("average_pace_seconds_per_km")?,
            longest_run_meters: row.try_get("longest_run_meters")?,
        })
    }
}

#[async_trait]
impl TrainingDataStore for TrainingManager {
    async fn active_goal(&self, user_id: Uuid) -> AppResult<Option<RaceGoal>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, race_name, race_date, race_distance_meters,
                   target_time_seconds, goal_type, is_active
            FROM race_goals
            WHERE user_id = $1 AND is_active = 1
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get active goal: {e}")))?;

        row.as_ref().map(Self::goal_from_row).transpose()
    }

    async fn recent_activities(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<Activity>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, source, name, distance_meters, duration_seconds, start_time
            FROM activities
            WHERE user_id = $1 AND start_time >= $2
            ORDER BY start_time DESC
            ",
        )
        .bind(user_id.to_string())
        .bind(encode_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent activities: {e}")))?;

        rows.iter().map(Self::activity_from_row).collect()
    }

    async fn recent_weekly_summaries(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<WeeklySummary>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, week_start, total_distance_meters, total_duration_seconds,
                   run_count, average_pace_seconds_per_km, longest_run_meters
            FROM weekly_summaries
            WHERE user_id = $1
            ORDER BY week_start DESC
            LIMIT $2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get weekly summaries: {e}")))?;

        rows.iter().map(Self::summary_from_row).collect()
    }

    async fn longest_recent_distance(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<f64> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(MAX(distance_meters), 0.0) AS longest
            FROM activities
            WHERE user_id = $1 AND start_time >= $2
            ",
        )
        .bind(user_id.to_string())
        .bind(encode_timestamp(since))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get longest run: {e}")))?;

        Ok(row.try_get("longest")?)
    }
}
