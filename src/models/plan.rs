// ABOUTME: Generated training plan models decoded from backend output
// ABOUTME: Plan entries are transient until a confirmed write turns them into calendar entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use super::WorkoutType;

/// One day of a generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Day as `YYYY-MM-DD`; kept as text so one bad date only skips its entry
    pub date: String,
    /// Workout type
    pub workout_type: WorkoutType,
    /// Short title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Distance in km (0 for rest days)
    #[serde(default)]
    pub distance_km: f64,
    /// Target pace in seconds per km
    #[serde(default)]
    pub pace_per_km: f64,
}

/// Structured plan returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    /// One entry per planned day
    pub plan: Vec<PlanEntry>,
    /// Short description of the plan
    #[serde(default)]
    pub summary: String,
}

/// An entry the writer could not persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPlanEntry {
    /// The entry's date text as received
    pub date: String,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of writing a plan to the calendar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWriteReport {
    /// Entries upserted
    pub written: usize,
    /// Entries skipped
    pub skipped: Vec<SkippedPlanEntry>,
}
