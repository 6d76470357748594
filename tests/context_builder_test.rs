// ABOUTME: Integration tests for training context assembly over SQLite and failing collaborators
// ABOUTME: Verifies placeholders, section order, trend labels, and tolerance of partial query failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use common::{activity, create_test_database, race_goal, weekly_summary};
use korsana_coach::context::{ContextBuilder, SectionKind};
use korsana_coach::database::{CalendarStore, Database, TrainingDataStore};
use korsana_coach::errors::{AppError, AppResult};
use korsana_coach::models::{
    Activity, CalendarEntry, EntryStatus, NewCalendarEntry, RaceGoal, WeeklySummary, WorkoutType,
};
use uuid::Uuid;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

fn builder(database: &Database) -> ContextBuilder {
    ContextBuilder::new(Arc::new(database.training()), Arc::new(database.calendar()))
}

fn week(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap() - Duration::weeks(offset)
}

#[tokio::test]
async fn test_empty_history_yields_placeholders() {
    let database = create_test_database().await;
    let snapshot = builder(&database)
        .build_at(Uuid::new_v4(), fixed_now())
        .await;

    assert_eq!(snapshot.sections().len(), 2);
    assert_eq!(
        snapshot.render(),
        "Race Goal: No active race goal set yet.\n\
         Recent Training: No activities recorded in the last 14 days."
    );
}

#[tokio::test]
async fn test_full_snapshot_renders_sections_in_order() {
    let database = create_test_database().await;
    let training = database.training();
    let user = Uuid::new_v4();
    let now = fixed_now();

    training
        .save_goal(&race_goal(
            user,
            NaiveDate::from_ymd_opt(2025, 4, 20).unwrap(),
            Some(12_600),
        ))
        .await
        .unwrap();
    training
        .record_activity(&activity(user, now - Duration::days(2), 10_000.0, 3_000))
        .await
        .unwrap();
    training
        .record_activity(&activity(user, now - Duration::days(5), 5_000.0, 1_500))
        .await
        .unwrap();
    // Outside the 14-day window but inside the 21-day window
    training
        .record_activity(&activity(user, now - Duration::days(18), 30_000.0, 9_900))
        .await
        .unwrap();
    for (offset, km) in [(0, 12.0), (1, 10.0), (2, 10.0), (3, 10.0)] {
        training
            .upsert_weekly_summary(&weekly_summary(user, week(offset), km, 3))
            .await
            .unwrap();
    }
    database
        .calendar()
        .upsert_entry(
            user,
            NewCalendarEntry {
                date: NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
                workout_type: WorkoutType::Tempo,
                title: "Tempo Tuesday".to_owned(),
                description: None,
                planned_distance_meters: Some(8_000),
                planned_pace_per_km: Some(300),
                status: EntryStatus::Planned,
                source: "manual".to_owned(),
            },
        )
        .await
        .unwrap();

    let snapshot = builder(&database).build_at(user, now).await;
    let kinds: Vec<SectionKind> = snapshot.sections().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SectionKind::Goal,
            SectionKind::RecentActivity,
            SectionKind::WeeklySummaries,
            SectionKind::VolumeTrend,
            SectionKind::Consistency,
            SectionKind::LongestRun,
            SectionKind::UpcomingWorkouts,
        ]
    );

    let goal = &snapshot.section(SectionKind::Goal).unwrap().text;
    assert!(goal.starts_with("Race Goal: City Marathon on 2025-04-20 (40 days away)"));
    assert!(goal.ends_with("Target Time: 3:30:00"));

    let recent = &snapshot.section(SectionKind::RecentActivity).unwrap().text;
    assert!(recent.contains("- Total runs: 2"));
    assert!(recent.contains("- Total distance: 15.0 km"));
    assert!(recent.contains("- Average pace: 300 seconds/km"));

    assert_eq!(
        snapshot.section(SectionKind::VolumeTrend).unwrap().text,
        "Volume Trend: increasing (this week 12.0 km vs avg 10.0 km)"
    );
    assert_eq!(
        snapshot.section(SectionKind::Consistency).unwrap().text,
        "Consistency: 4 out of last 4 weeks had 3+ runs"
    );
    assert_eq!(
        snapshot.section(SectionKind::LongestRun).unwrap().text,
        "Longest Run (last 3 weeks): 30.0 km"
    );
    assert_eq!(
        snapshot.section(SectionKind::UpcomingWorkouts).unwrap().text,
        "Upcoming Planned Workouts (next 7 days):\n- Tue Mar 11: Tempo Tuesday (tempo, 8.0 km)"
    );
}

async fn trend_label(latest: f64, prior: &[f64]) -> Option<String> {
    let database = create_test_database().await;
    let training = database.training();
    let user = Uuid::new_v4();

    training
        .upsert_weekly_summary(&weekly_summary(user, week(0), latest, 3))
        .await
        .unwrap();
    for (index, km) in prior.iter().enumerate() {
        training
            .upsert_weekly_summary(&weekly_summary(user, week(i64::try_from(index).unwrap() + 1), *km, 3))
            .await
            .unwrap();
    }

    builder(&database)
        .build_at(user, fixed_now())
        .await
        .section(SectionKind::VolumeTrend)
        .map(|section| section.text.clone())
}

#[tokio::test]
async fn test_trend_labels() {
    let increasing = trend_label(12.0, &[10.0, 10.0, 10.0]).await.unwrap();
    assert!(increasing.starts_with("Volume Trend: increasing"));

    let decreasing = trend_label(3.0, &[5.0, 5.0, 5.0]).await.unwrap();
    assert!(decreasing.starts_with("Volume Trend: decreasing"));

    let stable = trend_label(10.0, &[10.0, 10.0, 10.0]).await.unwrap();
    assert!(stable.starts_with("Volume Trend: stable"));
}

#[tokio::test]
async fn test_trend_bounds_are_exclusive() {
    let upper = trend_label(11.0, &[10.0, 10.0, 10.0]).await.unwrap();
    assert!(upper.starts_with("Volume Trend: stable"), "{upper}");

    let lower = trend_label(8.0, &[10.0, 10.0, 10.0]).await.unwrap();
    assert!(lower.starts_with("Volume Trend: stable"), "{lower}");
}

#[tokio::test]
async fn test_single_week_has_no_trend() {
    assert!(trend_label(10.0, &[]).await.is_none());
}

// ============================================================================
// Partial failure
// ============================================================================

/// Training store where only the goal and summary queries fail
struct PartlyBrokenTraining {
    activities: Vec<Activity>,
}

#[async_trait]
impl TrainingDataStore for PartlyBrokenTraining {
    async fn active_goal(&self, _user_id: Uuid) -> AppResult<Option<RaceGoal>> {
        Err(AppError::database("goal table locked"))
    }

    async fn recent_activities(
        &self,
        _user_id: Uuid,
        _since: DateTime<Utc>,
    ) -> AppResult<Vec<Activity>> {
        Ok(self.activities.clone())
    }

    async fn recent_weekly_summaries(
        &self,
        _user_id: Uuid,
        _limit: u32,
    ) -> AppResult<Vec<WeeklySummary>> {
        Err(AppError::database("summary view missing"))
    }

    async fn longest_recent_distance(
        &self,
        _user_id: Uuid,
        _since: DateTime<Utc>,
    ) -> AppResult<f64> {
        Ok(21_097.0)
    }
}

struct BrokenCalendar;

#[async_trait]
impl CalendarStore for BrokenCalendar {
    async fn upcoming_entries(
        &self,
        _user_id: Uuid,
        _from: NaiveDate,
        _days: u32,
    ) -> AppResult<Vec<CalendarEntry>> {
        Err(AppError::database("calendar unavailable"))
    }

    async fn upsert_entry(
        &self,
        _user_id: Uuid,
        _entry: NewCalendarEntry,
    ) -> AppResult<CalendarEntry> {
        Err(AppError::database("calendar unavailable"))
    }
}

#[tokio::test]
async fn test_failed_queries_do_not_cancel_the_others() {
    let user = Uuid::new_v4();
    let training = PartlyBrokenTraining {
        activities: vec![activity(user, fixed_now(), 8_000.0, 2_400)],
    };
    let builder = ContextBuilder::new(Arc::new(training), Arc::new(BrokenCalendar));

    let snapshot = builder.build_at(user, fixed_now()).await;
    let kinds: Vec<SectionKind> = snapshot.sections().iter().map(|s| s.kind).collect();

    assert_eq!(
        kinds,
        vec![
            SectionKind::Goal,
            SectionKind::RecentActivity,
            SectionKind::LongestRun
        ]
    );
    assert_eq!(
        snapshot.section(SectionKind::Goal).unwrap().text,
        "Race Goal: No active race goal set yet."
    );
    assert!(snapshot
        .section(SectionKind::RecentActivity)
        .unwrap()
        .text
        .contains("- Total runs: 1"));
}
