// ABOUTME: Weekly volume trend and consistency metrics over recent weekly summaries
// ABOUTME: Pure functions over newest-first summaries, shared by the context builder and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::context::{
    CONSISTENCY_WEEKS, CONSISTENT_WEEK_RUNS, TREND_DECREASING_RATIO, TREND_INCREASING_RATIO,
    TREND_PRIOR_WEEKS,
};
use crate::models::WeeklySummary;

/// Direction of weekly training volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    /// Ratio above the increasing bound
    Increasing,
    /// Ratio within both bounds (inclusive)
    Stable,
    /// Ratio below the decreasing bound
    Decreasing,
}

impl VolumeTrend {
    /// Classify a this-week / prior-average ratio; both bounds are exclusive
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > TREND_INCREASING_RATIO {
            Self::Increasing
        } else if ratio < TREND_DECREASING_RATIO {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }

    /// Label used in the context text
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Stable => "stable",
            Self::Decreasing => "decreasing",
        }
    }
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend of the latest week against the weeks before it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Classification
    pub trend: VolumeTrend,
    /// Latest week's distance in meters
    pub this_week_meters: f64,
    /// Mean distance of the prior weeks in meters
    pub prior_average_meters: f64,
}

/// Compare the most recent week with the mean of up to three prior weeks
///
/// `summaries` must be newest first. Returns `None` with fewer than two weeks
/// or when the prior weeks have no volume.
#[must_use]
pub fn volume_trend(summaries: &[WeeklySummary]) -> Option<TrendReport> {
    let (latest, older) = summaries.split_first()?;
    let prior: Vec<f64> = older
        .iter()
        .take(TREND_PRIOR_WEEKS)
        .map(|week| week.total_distance_meters)
        .collect();
    if prior.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let prior_average = prior.iter().sum::<f64>() / prior.len() as f64;
    if prior_average <= 0.0 {
        return None;
    }

    Some(TrendReport {
        trend: VolumeTrend::from_ratio(latest.total_distance_meters / prior_average),
        this_week_meters: latest.total_distance_meters,
        prior_average_meters: prior_average,
    })
}

/// How many of the most recent weeks (up to four) had at least three runs
///
/// Returns `(consistent_weeks, weeks_considered)`.
#[must_use]
pub fn consistency(summaries: &[WeeklySummary]) -> (usize, usize) {
    let considered = summaries.len().min(CONSISTENCY_WEEKS);
    let consistent = summaries
        .iter()
        .take(considered)
        .filter(|week| week.run_count >= CONSISTENT_WEEK_RUNS)
        .count();
    (consistent, considered)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;

    fn week(km: f64, runs: i64) -> WeeklySummary {
        WeeklySummary {
            user_id: Uuid::nil(),
            week_start: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            total_distance_meters: km * 1000.0,
            total_duration_seconds: 0,
            run_count: runs,
            average_pace_seconds_per_km: 0.0,
            longest_run_meters: None,
        }
    }

    fn trend_of(latest: f64, prior: &[f64]) -> Option<VolumeTrend> {
        let mut weeks = vec![week(latest, 3)];
        weeks.extend(prior.iter().map(|km| week(*km, 3)));
        volume_trend(&weeks).map(|report| report.trend)
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(trend_of(12.0, &[10.0, 10.0, 10.0]), Some(VolumeTrend::Increasing));
        assert_eq!(trend_of(3.0, &[5.0, 5.0, 5.0]), Some(VolumeTrend::Decreasing));
        assert_eq!(trend_of(10.0, &[10.0, 10.0, 10.0]), Some(VolumeTrend::Stable));
    }

    #[test]
    fn test_trend_bounds_are_exclusive() {
        assert_eq!(VolumeTrend::from_ratio(1.1), VolumeTrend::Stable);
        assert_eq!(VolumeTrend::from_ratio(0.8), VolumeTrend::Stable);
        assert_eq!(VolumeTrend::from_ratio(1.100_001), VolumeTrend::Increasing);
        assert_eq!(VolumeTrend::from_ratio(0.799_999), VolumeTrend::Decreasing);
    }

    #[test]
    fn test_trend_uses_at_most_three_prior_weeks() {
        // The fifth week would drag the average down if it were counted
        let report = volume_trend(&[
            week(10.0, 3),
            week(10.0, 3),
            week(10.0, 3),
            week(10.0, 3),
            week(0.0, 0),
        ])
        .unwrap();
        assert_eq!(report.trend, VolumeTrend::Stable);
        assert!((report.prior_average_meters - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trend_needs_prior_volume() {
        assert!(trend_of(10.0, &[]).is_none());
        assert!(trend_of(10.0, &[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_consistency_counts_last_four_weeks() {
        let weeks = [
            week(10.0, 3),
            week(10.0, 2),
            week(10.0, 4),
            week(10.0, 3),
            week(10.0, 5),
        ];
        assert_eq!(consistency(&weeks), (3, 4));
        assert_eq!(consistency(&weeks[..2]), (1, 2));
    }
}
