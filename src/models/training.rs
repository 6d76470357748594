// ABOUTME: Training history models: race goals, synced activities, and weekly aggregates
// ABOUTME: Consumed read-only by the context builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the runner wants out of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Complete the distance
    #[default]
    Finish,
    /// Hit a target time
    Time,
    /// Beat a personal record
    Pr,
}

impl GoalType {
    /// Parse a stored value, defaulting to `Finish`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "time" => Self::Time,
            "pr" => Self::Pr,
            _ => Self::Finish,
        }
    }

    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Finish => "finish",
            Self::Time => "time",
            Self::Pr => "pr",
        }
    }
}

/// A runner's race goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceGoal {
    /// Goal id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Race name
    pub race_name: String,
    /// Race day
    pub race_date: NaiveDate,
    /// Race distance in meters
    pub race_distance_meters: i64,
    /// Target finishing time; `None` means "just finish"
    pub target_time_seconds: Option<i64>,
    /// Goal type
    pub goal_type: GoalType,
    /// Only one goal per user is active
    pub is_active: bool,
}

/// A completed run synced from a tracker or entered manually
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Origin ("strava", "manual", ...)
    pub source: String,
    /// Display name
    pub name: String,
    /// Distance in meters
    pub distance_meters: f64,
    /// Moving time in seconds
    pub duration_seconds: i64,
    /// Start time
    pub start_time: DateTime<Utc>,
}

/// Aggregated training for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// Owner
    pub user_id: Uuid,
    /// First day of the week
    pub week_start: NaiveDate,
    /// Total distance in meters
    pub total_distance_meters: f64,
    /// Total duration in seconds
    pub total_duration_seconds: i64,
    /// Number of runs
    pub run_count: i64,
    /// Average pace in seconds per km
    pub average_pace_seconds_per_km: f64,
    /// Longest run of the week in meters
    pub longest_run_meters: Option<f64>,
}
