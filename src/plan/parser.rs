// ABOUTME: Decodes generated training plans from raw backend text
// ABOUTME: Strips one surrounding markdown fence, then decodes strictly with no repair
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::models::PlanResponse;

const FENCE: &str = "```";

/// Remove one leading fence marker (with or without a language tag) and one trailing marker
///
/// Text without fences is returned trimmed. Nothing else is rewritten.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        // Language tag runs up to the first non-alphanumeric character
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
            .unwrap_or(rest.len());
        text = rest[tag_len..].trim_start();
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest.trim_end();
    }

    text
}

/// Decode a plan response
///
/// # Errors
///
/// Returns `PlanParseFailed` (with the raw text in the details) when the JSON
/// does not decode, the plan is empty, or a distance or pace is negative or
/// not finite
pub fn parse_plan(raw: &str) -> AppResult<PlanResponse> {
    let plan: PlanResponse = serde_json::from_str(strip_code_fences(raw)).map_err(|e| {
        warn!(error = %e, raw_len = raw.len(), "Failed to decode plan JSON");
        AppError::plan_parse(e.to_string(), raw)
    })?;

    if plan.plan.is_empty() {
        return Err(AppError::plan_parse("plan contains no entries", raw));
    }

    if let Some(entry) = plan.plan.iter().find(|entry| {
        !is_valid_measure(entry.distance_km) || !is_valid_measure(entry.pace_per_km)
    }) {
        return Err(AppError::plan_parse(
            format!("entry for {} has a negative distance or pace", entry.date),
            raw,
        ));
    }

    Ok(plan)
}

fn is_valid_measure(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
