// ABOUTME: Builds the per-request training context snapshot sent to the AI coach
// ABOUTME: Five concurrent read queries, each section degrading independently on failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Training Context
//!
//! [`ContextBuilder::build`] reads the runner's goal, recent activities,
//! weekly summaries, longest recent run, and upcoming calendar entries
//! concurrently and renders them into an ordered [`ContextSnapshot`].
//!
//! The goal and recent-activity sections are always present: a failed or
//! empty query renders a neutral placeholder. The remaining sections are
//! omitted when their query fails or returns nothing useful. A snapshot is
//! built fresh for every request and never stored.

/// Section text rendering
pub mod sections;
/// Weekly volume trend and consistency
pub mod trend;

pub use trend::{TrendReport, VolumeTrend};

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::constants::context::{
    LONGEST_RUN_DAYS, RECENT_ACTIVITY_DAYS, UPCOMING_DAYS, WEEKLY_SUMMARY_LIMIT,
};
use crate::database::{CalendarStore, TrainingDataStore};

/// Context text used when nothing could be assembled
pub const NO_TRAINING_DATA: &str = "No training data available yet.";

/// Which part of the snapshot a section holds, in render order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Active race goal or placeholder
    Goal,
    /// Trailing 14-day activity totals or placeholder
    RecentActivity,
    /// Per-week lines
    WeeklySummaries,
    /// Latest week against the prior weeks
    VolumeTrend,
    /// Weeks with three or more runs
    Consistency,
    /// Longest run in the trailing 21 days
    LongestRun,
    /// Calendar entries for the next 7 days
    UpcomingWorkouts,
}

/// One rendered section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSection {
    /// Section kind
    pub kind: SectionKind,
    /// Rendered text (may span several lines)
    pub text: String,
}

/// Ordered, human-readable summary of a runner's training state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    sections: Vec<ContextSection>,
}

impl ContextSnapshot {
    /// Sections in render order
    #[must_use]
    pub fn sections(&self) -> &[ContextSection] {
        &self.sections
    }

    /// Section of a given kind, if present
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> Option<&ContextSection> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    /// Whether no section was produced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections joined by newlines, or the no-data text when empty
    #[must_use]
    pub fn render(&self) -> String {
        if self.sections.is_empty() {
            return NO_TRAINING_DATA.to_owned();
        }
        self.sections
            .iter()
            .map(|section| section.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, kind: SectionKind, text: String) {
        self.sections.push(ContextSection { kind, text });
    }
}

/// Assembles [`ContextSnapshot`]s from the training and calendar collaborators
#[derive(Clone)]
pub struct ContextBuilder {
    training: Arc<dyn TrainingDataStore>,
    calendar: Arc<dyn CalendarStore>,
}

impl ContextBuilder {
    /// Create a builder over the two collaborators
    #[must_use]
    pub fn new(training: Arc<dyn TrainingDataStore>, calendar: Arc<dyn CalendarStore>) -> Self {
        Self { training, calendar }
    }

    /// Build a snapshot for the user as of now
    pub async fn build(&self, user_id: Uuid) -> ContextSnapshot {
        self.build_at(user_id, Utc::now()).await
    }

    /// Build a snapshot for the user as of `now`
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn build_at(&self, user_id: Uuid, now: DateTime<Utc>) -> ContextSnapshot {
        let activity_since = now - Duration::days(i64::from(RECENT_ACTIVITY_DAYS));
        let longest_since = now - Duration::days(i64::from(LONGEST_RUN_DAYS));

        let (goal, activities, summaries, longest, upcoming) = tokio::join!(
            self.training.active_goal(user_id),
            self.training.recent_activities(user_id, activity_since),
            self.training
                .recent_weekly_summaries(user_id, WEEKLY_SUMMARY_LIMIT),
            self.training.longest_recent_distance(user_id, longest_since),
            self.calendar
                .upcoming_entries(user_id, now.date_naive(), UPCOMING_DAYS),
        );

        let mut snapshot = ContextSnapshot::default();

        let goal = goal.unwrap_or_else(|e| {
            warn!(error = %e, "Active goal query failed");
            None
        });
        snapshot.push(SectionKind::Goal, sections::goal_section(goal.as_ref(), now));

        let activities = activities.unwrap_or_else(|e| {
            warn!(error = %e, "Recent activities query failed");
            Vec::new()
        });
        snapshot.push(
            SectionKind::RecentActivity,
            sections::recent_activity_section(&activities),
        );

        match summaries {
            Ok(summaries) => {
                if let Some(text) = sections::weekly_summary_section(&summaries) {
                    snapshot.push(SectionKind::WeeklySummaries, text);
                    if let Some(report) = trend::volume_trend(&summaries) {
                        snapshot.push(SectionKind::VolumeTrend, sections::trend_section(&report));
                    }
                    let (consistent, considered) = trend::consistency(&summaries);
                    snapshot.push(
                        SectionKind::Consistency,
                        sections::consistency_section(consistent, considered),
                    );
                }
            }
            Err(e) => warn!(error = %e, "Weekly summaries query failed"),
        }

        match longest {
            Ok(meters) => {
                if let Some(text) = sections::longest_run_section(meters) {
                    snapshot.push(SectionKind::LongestRun, text);
                }
            }
            Err(e) => warn!(error = %e, "Longest run query failed"),
        }

        match upcoming {
            Ok(entries) => {
                if let Some(text) = sections::upcoming_section(&entries) {
                    snapshot.push(SectionKind::UpcomingWorkouts, text);
                }
            }
            Err(e) => warn!(error = %e, "Upcoming calendar query failed"),
        }

        debug!(sections = snapshot.sections.len(), "Training context built");
        snapshot
    }
}
