// ABOUTME: System prompts for coach chat, dashboard insights, and plan generation
// ABOUTME: Templates are loaded at compile time and filled with the runner's training context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.
//! Each template has a `{training_context}` slot; the plan template also takes
//! the workout type vocabulary and the dated list of days to plan.

use chrono::{Duration, NaiveDate};

use crate::models::WorkoutType;

const COACH_SYSTEM_TEMPLATE: &str = include_str!("coach_system.md");
const INSIGHT_SYSTEM_TEMPLATE: &str = include_str!("insight_system.md");
const PLAN_SYSTEM_TEMPLATE: &str = include_str!("plan_system.md");

/// User turn sent with an insight request
pub const INSIGHT_USER_MESSAGE: &str = "Give me a brief coaching insight for my dashboard today.";

/// System prompt for a coach conversation
#[must_use]
pub fn coach_system_prompt(training_context: &str) -> String {
    COACH_SYSTEM_TEMPLATE
        .trim_end()
        .replace("{training_context}", training_context)
}

/// System prompt for a one-shot dashboard insight
#[must_use]
pub fn insight_system_prompt(training_context: &str) -> String {
    INSIGHT_SYSTEM_TEMPLATE
        .trim_end()
        .replace("{training_context}", training_context)
}

/// System prompt for plan generation covering `days` days after `today`
#[must_use]
pub fn plan_system_prompt(training_context: &str, today: NaiveDate, days: u32) -> String {
    let workout_types = WorkoutType::ALL
        .iter()
        .map(|workout| workout.as_str())
        .collect::<Vec<_>>()
        .join("|");

    PLAN_SYSTEM_TEMPLATE
        .trim_end()
        .replace("{workout_types}", &workout_types)
        .replace("{plan_dates}", plan_date_list(today, days).trim_end())
        // Athlete-supplied text goes in last so its braces stay literal
        .replace("{training_context}", training_context)
}

/// User turn sent with a plan request
#[must_use]
pub fn plan_user_message(days: u32) -> String {
    format!(
        "Generate a {days}-day training plan for me starting tomorrow. Respond with ONLY the JSON."
    )
}

/// Days to plan, starting the day after `today`, one `- YYYY-MM-DD (Weekday)` line each
#[must_use]
pub fn plan_date_list(today: NaiveDate, days: u32) -> String {
    (1..=i64::from(days))
        .map(|offset| today + Duration::days(offset))
        .map(|date| format!("- {}\n", date.format("%Y-%m-%d (%A)")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_dates_start_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let list = plan_date_list(today, 2);
        assert_eq!(list, "- 2025-03-03 (Monday)\n- 2025-03-04 (Tuesday)\n");
    }

    #[test]
    fn test_plan_prompt_fills_every_slot() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let prompt = plan_system_prompt("Race Goal: No active race goal set yet.", today, 7);
        assert!(prompt.contains("Race Goal: No active race goal set yet."));
        assert!(prompt.contains("easy|tempo|interval|long|recovery|rest|race|cross_train"));
        assert!(prompt.contains("- 2025-03-09 (Sunday)"));
        assert!(!prompt.contains("{training_context}"));
        assert!(!prompt.contains("{plan_dates}"));
    }

    #[test]
    fn test_plan_prompt_keeps_placeholders_inside_context() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let prompt = plan_system_prompt(
            "Race Goal: {plan_dates} Marathon, {workout_types} fan",
            today,
            7,
        );
        assert!(prompt.contains("Race Goal: {plan_dates} Marathon, {workout_types} fan"));
        assert_eq!(prompt.matches("- 2025-03-03 (Monday)").count(), 1);
    }

    #[test]
    fn test_coach_prompt_embeds_context() {
        let prompt = coach_system_prompt("Recent Training: none");
        assert!(prompt.starts_with("You are Korsana"));
        assert!(prompt.contains("Current runner's context:\nRecent Training: none"));
    }
}
