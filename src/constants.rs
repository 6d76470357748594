// ABOUTME: System-wide constants for quota windows, history limits, and request validation
// ABOUTME: Defaults here are overridable through environment configuration where noted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Fixed values and configuration defaults for the coach.

/// Quota defaults (overridable via `COACH_*` environment variables)
pub mod quota {
    /// Global daily ceiling across all users
    pub const DEFAULT_GLOBAL_DAILY_LIMIT: u32 = 1400;
    /// Per-user hourly ceiling
    pub const DEFAULT_USER_HOURLY_LIMIT: u32 = 10;
    /// Per-user daily ceiling
    pub const DEFAULT_USER_DAILY_LIMIT: u32 = 50;
    /// Extra lifetime on day-window counters to tolerate clock skew
    pub const DEFAULT_DAY_MARGIN_SECS: u64 = 3600;
    /// Hour window length
    pub const HOUR_WINDOW_SECS: u64 = 3600;
    /// Day window length
    pub const DAY_WINDOW_SECS: u64 = 86_400;
    /// Prefix for every counter key
    pub const KEY_PREFIX: &str = "korsana:quota";
    /// In-memory store sweeps expired keys once per this many increments
    pub const MEMORY_PURGE_INTERVAL: u64 = 1024;
}

/// Context assembly windows
pub mod context {
    /// Trailing days summarised in the recent-activity section
    pub const RECENT_ACTIVITY_DAYS: u32 = 14;
    /// Weekly summaries pulled for the trend section
    pub const WEEKLY_SUMMARY_LIMIT: u32 = 6;
    /// Trailing days searched for the longest run
    pub const LONGEST_RUN_DAYS: u32 = 21;
    /// Days ahead covered by the upcoming workouts section
    pub const UPCOMING_DAYS: u32 = 7;
    /// Prior weeks averaged for the volume trend
    pub const TREND_PRIOR_WEEKS: usize = 3;
    /// Weeks inspected for the consistency count
    pub const CONSISTENCY_WEEKS: usize = 4;
    /// Runs per week that count as a consistent week
    pub const CONSISTENT_WEEK_RUNS: i64 = 3;
    /// Ratio above which volume is increasing
    pub const TREND_INCREASING_RATIO: f64 = 1.1;
    /// Ratio below which volume is decreasing
    pub const TREND_DECREASING_RATIO: f64 = 0.8;
}

/// Conversation and request limits
pub mod limits {
    /// Maximum characters in a coach message
    pub const MAX_MESSAGE_CHARS: usize = 1000;
    /// Turns of history sent to the backend with a new message
    pub const CONTEXT_HISTORY_TURNS: u32 = 10;
    /// Default number of turns returned by the history operation
    pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
    /// Plan length used when the requested days are out of range
    pub const DEFAULT_PLAN_DAYS: u32 = 7;
    /// Longest plan that can be requested
    pub const MAX_PLAN_DAYS: u32 = 14;
}

/// LLM call defaults
pub mod llm {
    /// Backend call timeout
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
    /// Output token ceiling for chat and insight calls
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
    /// Output token ceiling for plan generation (a 14-day plan is long)
    pub const PLAN_MAX_OUTPUT_TOKENS: u32 = 4096;
    /// Default Gemini model
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
    /// Default Claude model
    pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-5-20250929";
    /// Gemini API base URL
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    /// Anthropic API base URL
    pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
    /// Anthropic API version header value
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";
}

/// Calendar entry values written by the plan writer
pub mod calendar {
    /// Source tag for entries created from a generated plan
    pub const AI_COACH_SOURCE: &str = "ai_coach";
}
