// ABOUTME: SQLite calendar collaborator with create-or-replace writes keyed by (user, date)
// ABOUTME: Serves upcoming planned workouts to the context builder and plan writes to the coach
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{decode_date, decode_timestamp, decode_uuid, encode_date, encode_timestamp, CalendarStore};
use crate::errors::{AppError, AppResult};
use crate::models::{CalendarEntry, EntryStatus, NewCalendarEntry, WorkoutType};

const ENTRY_COLUMNS: &str = "id, user_id, date, workout_type, title, description, \
     planned_distance_meters, planned_pace_per_km, status, source, created_at, updated_at";

/// Calendar database operations manager
#[derive(Clone)]
pub struct CalendarManager {
    pool: SqlitePool,
}

impl CalendarManager {
    /// Create a new calendar manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn entry_from_row(row: &SqliteRow) -> AppResult<CalendarEntry> {
        Ok(CalendarEntry {
            id: decode_uuid(&row.try_get::<String, _>("id")?)?,
            user_id: decode_uuid(&row.try_get::<String, _>("user_id")?)?,
            date: decode_date(&row.try_get::<String, _>("date")?)?,
            workout_type: row
                .try_get::<String, _>("workout_type")?
                .parse::<WorkoutType>()
                .map_err(|e| AppError::database(e.message))?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            planned_distance_meters: row.try_get("planned_distance_meters")?,
            planned_pace_per_km: row.try_get("planned_pace_per_km")?,
            status: EntryStatus::from_str_or_default(&row.try_get::<String, _>("status")?),
            source: row.try_get("source")?,
            created_at: decode_timestamp(&row.try_get::<String, _>("created_at")?)?,
            updated_at: decode_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        })
    }
}

#[async_trait]
impl CalendarStore for CalendarManager {
    async fn upcoming_entries(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        days: u32,
    ) -> AppResult<Vec<CalendarEntry>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let until = from + Duration::days(i64::from(days) - 1);

        let rows = sqlx::query(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM calendar_entries
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "
        ))
        .bind(user_id.to_string())
        .bind(encode_date(from))
        .bind(encode_date(until))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get upcoming entries: {e}")))?;

        rows.iter().map(Self::entry_from_row).collect()
    }

    async fn upsert_entry(
        &self,
        user_id: Uuid,
        entry: NewCalendarEntry,
    ) -> AppResult<CalendarEntry> {
        let now = encode_timestamp(Utc::now());

        let row = sqlx::query(&format!(
            r"
            INSERT INTO calendar_entries (id, user_id, date, workout_type, title, description,
                planned_distance_meters, planned_pace_per_km, status, source, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ON CONFLICT(user_id, date) DO UPDATE SET
                workout_type = excluded.workout_type,
                title = excluded.title,
                description = excluded.description,
                planned_distance_meters = excluded.planned_distance_meters,
                planned_pace_per_km = excluded.planned_pace_per_km,
                status = excluded.status,
                source = excluded.source,
                updated_at = excluded.updated_at
            RETURNING {ENTRY_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(encode_date(entry.date))
        .bind(entry.workout_type.as_str())
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(entry.planned_distance_meters)
        .bind(entry.planned_pace_per_km)
        .bind(entry.status.as_str())
        .bind(&entry.source)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert calendar entry: {e}")))?;

        Self::entry_from_row(&row)
    }
}
