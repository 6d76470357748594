// ABOUTME: Core data models for training history, calendar entries, conversations, and plans
// ABOUTME: Shared by the stores, the context builder, and the coach service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - **Training**: race goals, activities, and weekly aggregates (read-only here)
//! - **Calendar**: planned workouts, upserted by (user, date)
//! - **Conversation**: immutable coach turns
//! - **Plan**: transient plan entries decoded from backend output

/// Calendar entries and workout types
pub mod calendar;
/// Conversation turns
pub mod conversation;
/// Generated training plans
pub mod plan;
/// Race goals, activities, weekly summaries
pub mod training;

pub use calendar::{CalendarEntry, EntryStatus, NewCalendarEntry, WorkoutType};
pub use conversation::ConversationTurn;
pub use plan::{PlanEntry, PlanResponse, PlanWriteReport, SkippedPlanEntry};
pub use training::{Activity, GoalType, RaceGoal, WeeklySummary};
