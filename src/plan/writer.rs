// ABOUTME: Persists confirmed plan entries as calendar entries through the calendar collaborator
// ABOUTME: Bad entries are skipped individually; the write fails only when nothing was saved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::constants::calendar::AI_COACH_SOURCE;
use crate::database::CalendarStore;
use crate::errors::{AppError, AppResult};
use crate::models::{EntryStatus, NewCalendarEntry, PlanEntry, PlanWriteReport, SkippedPlanEntry};

/// Writes plan entries to the calendar
#[derive(Clone)]
pub struct PlanWriter {
    calendar: Arc<dyn CalendarStore>,
}

impl PlanWriter {
    /// Create a writer over the calendar collaborator
    #[must_use]
    pub fn new(calendar: Arc<dyn CalendarStore>) -> Self {
        Self { calendar }
    }

    /// Upsert every entry keyed by (user, date)
    ///
    /// Entries with an unparseable date, or whose upsert fails, are logged and
    /// listed in the report's `skipped`.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the plan had entries and none were written
    #[instrument(skip(self, entries), fields(user_id = %user_id, entries = entries.len()))]
    pub async fn write(&self, user_id: Uuid, entries: &[PlanEntry]) -> AppResult<PlanWriteReport> {
        let mut report = PlanWriteReport::default();

        for entry in entries {
            let Some(new_entry) = to_calendar_entry(entry) else {
                warn!(date = %entry.date, "Skipping plan entry with invalid date");
                report.skipped.push(SkippedPlanEntry {
                    date: entry.date.clone(),
                    reason: "invalid date".to_owned(),
                });
                continue;
            };

            match self.calendar.upsert_entry(user_id, new_entry).await {
                Ok(_) => report.written += 1,
                Err(e) => {
                    warn!(date = %entry.date, error = %e, "Failed to write calendar entry");
                    report.skipped.push(SkippedPlanEntry {
                        date: entry.date.clone(),
                        reason: e.message,
                    });
                }
            }
        }

        if report.written == 0 && !entries.is_empty() {
            return Err(AppError::storage(format!(
                "Plan generated but failed to save to calendar: {} of {} entries rejected",
                report.skipped.len(),
                entries.len()
            )));
        }

        info!(
            written = report.written,
            skipped = report.skipped.len(),
            "Plan written to calendar"
        );
        Ok(report)
    }
}

/// Convert a plan entry; `None` when its date does not parse
#[must_use]
pub fn to_calendar_entry(entry: &PlanEntry) -> Option<NewCalendarEntry> {
    let date = NaiveDate::parse_from_str(entry.date.trim(), "%Y-%m-%d").ok()?;
    Some(NewCalendarEntry {
        date,
        workout_type: entry.workout_type,
        title: entry.title.clone(),
        description: (!entry.description.is_empty()).then(|| entry.description.clone()),
        planned_distance_meters: whole_positive(entry.distance_km * 1000.0),
        planned_pace_per_km: whole_positive(entry.pace_per_km),
        status: EntryStatus::Planned,
        source: AI_COACH_SOURCE.to_owned(),
    })
}

/// Round to a whole number; zero and invalid values become `None`
#[allow(clippy::cast_possible_truncation)]
fn whole_positive(value: f64) -> Option<i64> {
    let rounded = value.round();
    (rounded.is_finite() && rounded >= 1.0).then_some(rounded as i64)
}
