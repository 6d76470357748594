// ABOUTME: Text rendering for each training context section
// ABOUTME: Goal, recent activity, weekly summaries, trend, consistency, longest run, upcoming workouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::trend::TrendReport;
use crate::constants::context::{LONGEST_RUN_DAYS, RECENT_ACTIVITY_DAYS, UPCOMING_DAYS};
use crate::models::{Activity, CalendarEntry, RaceGoal, WeeklySummary};

/// Placeholder when the user has no active goal
pub const NO_GOAL_TEXT: &str = "Race Goal: No active race goal set yet.";

const METERS_PER_KM: f64 = 1000.0;
const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `now` until race day (truncated toward zero)
#[must_use]
pub fn days_until(goal: &RaceGoal, now: DateTime<Utc>) -> i64 {
    goal.race_date
        .and_hms_opt(0, 0, 0)
        .map_or(0, |midnight| {
            (midnight.and_utc() - now).num_seconds() / SECONDS_PER_DAY
        })
}

/// `H:MM:SS`, or "Just finish" without a target
#[must_use]
pub fn format_target_time(target_seconds: Option<i64>) -> String {
    match target_seconds {
        None => "Just finish".to_owned(),
        Some(total) => {
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let seconds = total % 60;
            format!("{hours}:{minutes:02}:{seconds:02}")
        }
    }
}

/// Active goal, or the neutral placeholder
#[must_use]
pub fn goal_section(goal: Option<&RaceGoal>, now: DateTime<Utc>) -> String {
    goal.map_or_else(
        || NO_GOAL_TEXT.to_owned(),
        |goal| {
            #[allow(clippy::cast_precision_loss)]
            let distance_km = goal.race_distance_meters as f64 / METERS_PER_KM;
            format!(
                "Race Goal: {} on {} ({} days away)\nDistance: {distance_km:.2} km\nTarget Time: {}",
                goal.race_name,
                goal.race_date.format("%Y-%m-%d"),
                days_until(goal, now),
                format_target_time(goal.target_time_seconds),
            )
        },
    )
}

/// Run count, distance and average pace over the trailing window, or a placeholder
#[must_use]
pub fn recent_activity_section(activities: &[Activity]) -> String {
    if activities.is_empty() {
        return format!(
            "Recent Training: No activities recorded in the last {RECENT_ACTIVITY_DAYS} days."
        );
    }

    let total_meters: f64 = activities.iter().map(|a| a.distance_meters).sum();
    let total_seconds: i64 = activities.iter().map(|a| a.duration_seconds).sum();
    let distance_km = total_meters / METERS_PER_KM;
    #[allow(clippy::cast_precision_loss)]
    let average_pace = if distance_km > 0.0 {
        total_seconds as f64 / distance_km
    } else {
        0.0
    };

    format!(
        "Recent Training (last {RECENT_ACTIVITY_DAYS} days):\n\
         - Total runs: {}\n\
         - Total distance: {distance_km:.1} km\n\
         - Average pace: {average_pace:.0} seconds/km",
        activities.len(),
    )
}

/// One line per recent week, newest first; `None` without summaries
#[must_use]
pub fn weekly_summary_section(summaries: &[WeeklySummary]) -> Option<String> {
    if summaries.is_empty() {
        return None;
    }
    let mut text = "Weekly Summaries (recent weeks):".to_owned();
    for week in summaries {
        let longest_km = week.longest_run_meters.unwrap_or(0.0) / METERS_PER_KM;
        let _ = write!(
            text,
            "\n- Week of {}: {:.1} km across {} runs, avg pace {:.0} s/km, longest run {longest_km:.1} km",
            week.week_start.format("%b %-d"),
            week.total_distance_meters / METERS_PER_KM,
            week.run_count,
            week.average_pace_seconds_per_km,
        );
    }
    Some(text)
}

/// Volume trend line
#[must_use]
pub fn trend_section(report: &TrendReport) -> String {
    format!(
        "Volume Trend: {} (this week {:.1} km vs avg {:.1} km)",
        report.trend,
        report.this_week_meters / METERS_PER_KM,
        report.prior_average_meters / METERS_PER_KM,
    )
}

/// Consistency line
#[must_use]
pub fn consistency_section(consistent_weeks: usize, weeks_considered: usize) -> String {
    format!("Consistency: {consistent_weeks} out of last {weeks_considered} weeks had 3+ runs")
}

/// Longest run line; `None` when there was no run in the window
#[must_use]
pub fn longest_run_section(longest_meters: f64) -> Option<String> {
    (longest_meters > 0.0).then(|| {
        format!(
            "Longest Run (last {} weeks): {:.1} km",
            LONGEST_RUN_DAYS / 7,
            longest_meters / METERS_PER_KM
        )
    })
}

/// Upcoming planned workouts; `None` when the calendar is empty
#[must_use]
pub fn upcoming_section(entries: &[CalendarEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let mut text = format!("Upcoming Planned Workouts (next {UPCOMING_DAYS} days):");
    for entry in entries {
        #[allow(clippy::cast_precision_loss)]
        let distance = entry
            .planned_distance_meters
            .map(|meters| format!(", {:.1} km", meters as f64 / METERS_PER_KM))
            .unwrap_or_default();
        let _ = write!(
            text,
            "\n- {}: {} ({}{distance})",
            entry.date.format("%a %b %-d"),
            entry.title,
            entry.workout_type,
        );
    }
    Some(text)
}
