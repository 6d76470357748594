// ABOUTME: Calendar entry models and the closed workout type vocabulary
// ABOUTME: Entries are keyed by (user, date); writes are create-or-replace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Workout types a plan entry or calendar entry can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    /// Easy aerobic run
    Easy,
    /// Sustained threshold effort
    Tempo,
    /// Repeats with recovery
    Interval,
    /// Long run
    Long,
    /// Very easy recovery run
    Recovery,
    /// Rest day
    Rest,
    /// Race day
    Race,
    /// Non-running training
    CrossTrain,
}

impl WorkoutType {
    /// All workout types, in prompt order
    pub const ALL: [Self; 8] = [
        Self::Easy,
        Self::Tempo,
        Self::Interval,
        Self::Long,
        Self::Recovery,
        Self::Rest,
        Self::Race,
        Self::CrossTrain,
    ];

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Tempo => "tempo",
            Self::Interval => "interval",
            Self::Long => "long",
            Self::Recovery => "recovery",
            Self::Rest => "rest",
            Self::Race => "race",
            Self::CrossTrain => "cross_train",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|workout| workout.as_str() == s)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown workout type: {s}")))
    }
}

/// Calendar entry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Scheduled, not yet done
    #[default]
    Planned,
    /// Done
    Completed,
    /// Skipped by the runner
    Skipped,
}

impl EntryStatus {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    /// Parse a stored value, defaulting to `Planned`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "skipped" => Self::Skipped,
            _ => Self::Planned,
        }
    }
}

/// A stored calendar entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Entry id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Day of the workout
    pub date: NaiveDate,
    /// Workout type
    pub workout_type: WorkoutType,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Planned distance in meters
    pub planned_distance_meters: Option<i64>,
    /// Planned pace in seconds per km
    pub planned_pace_per_km: Option<i64>,
    /// Lifecycle state
    pub status: EntryStatus,
    /// Who created the entry ("manual", "ai_coach", ...)
    pub source: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Values for a create-or-replace calendar write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalendarEntry {
    /// Day of the workout
    pub date: NaiveDate,
    /// Workout type
    pub workout_type: WorkoutType,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Planned distance in meters
    pub planned_distance_meters: Option<i64>,
    /// Planned pace in seconds per km
    pub planned_pace_per_km: Option<i64>,
    /// Lifecycle state
    pub status: EntryStatus,
    /// Who created the entry
    pub source: String,
}
