// ABOUTME: Domain service layer for the coach's inbound operations
// ABOUTME: Protocol-agnostic so an HTTP layer or the CLI can call it directly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer

/// Coach orchestration: send-message, insight, plan generation, history
pub mod coach;

pub use coach::{normalize_plan_days, CoachReply, CoachService, PlanOutcome};
