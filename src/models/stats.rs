// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived statistics returned by the aggregator.
//!
//! None of these are stored; they are recomputed from the run list (and
//! memoized for a short while by the store).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Time window for run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    #[default]
    All,
    Week,
    Month,
    Year,
}

/// Minutes and seconds per kilometer (or mile, for display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Pace {
    pub minutes: u32,
    pub seconds: u32,
}

impl Pace {
    /// Split a per-unit pace in seconds, rounding seconds and carrying 60 into minutes.
    pub fn from_seconds(total_seconds: f64) -> Self {
        let mut minutes = (total_seconds / 60.0).floor() as u32;
        let mut seconds = (total_seconds - minutes as f64 * 60.0).round() as u32;
        if seconds >= 60 {
            minutes += 1;
            seconds -= 60;
        }
        Self { minutes, seconds }
    }
}

/// Totals for a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunStats {
    pub total_runs: u32,
    /// Kilometers
    pub total_distance: f64,
    /// Seconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_duration: u64,
    /// Minutes/seconds per km; None when no distance
    pub avg_pace: Option<Pace>,
}

/// Distance and run count for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyUsage {
    /// "YYYY-MM"
    pub month: String,
    pub distance: f64,
    pub runs: u32,
}

/// Per-shoe derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShoeStats {
    pub shoe_id: String,

    // ─── Distance ────────────────────────────────────────────────
    pub total_runs: u32,
    pub total_distance: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_duration: u64,
    pub average_distance: f64,
    pub median_distance: f64,
    pub longest_run: f64,
    pub shortest_run: f64,

    // ─── Timeline ────────────────────────────────────────────────
    pub first_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub runs_per_week: f64,
    pub runs_per_month: f64,
    /// Kilometers per week over the span between first and last run
    pub weekly_average: f64,
    /// Trailing 12 calendar months, oldest first
    pub monthly_breakdown: Vec<MonthlyUsage>,

    // ─── Habits ──────────────────────────────────────────────────
    /// English weekday name, e.g. "Saturday"
    pub most_common_day: Option<String>,
    /// Hour of day (0-23, UTC)
    pub most_common_hour: Option<u32>,

    // ─── Lifespan ────────────────────────────────────────────────
    pub max_distance: f64,
    /// Kilometers left before the threshold (None when uncapped)
    pub remaining_distance: Option<f64>,
    /// Share of the threshold used, 0-100+ (None when uncapped)
    pub percentage_used: Option<f64>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub estimated_remaining_runs: Option<u64>,
    pub estimated_retirement_date: Option<DateTime<Utc>>,
}

/// One shoe's share of a trend bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShoeShare {
    pub shoe_id: String,
    pub shoe_name: String,
    pub distance: f64,
    pub run_count: u32,
    /// Percentage of the bucket's total distance
    pub percentage: f64,
}

/// Shoe usage for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsageTrend {
    /// "YYYY-MM"
    pub period: String,
    pub total_distance: f64,
    pub run_count: u32,
    pub shoes: Vec<ShoeShare>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace_from_seconds() {
        assert_eq!(
            Pace::from_seconds(330.0),
            Pace {
                minutes: 5,
                seconds: 30
            }
        );
        assert_eq!(
            Pace::from_seconds(59.6),
            Pace {
                minutes: 1,
                seconds: 0
            }
        );
    }

    #[test]
    fn test_period_wire_names() {
        let period: StatsPeriod = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(period, StatsPeriod::Week);
        assert_eq!(serde_json::to_string(&StatsPeriod::All).unwrap(), "\"all\"");
    }
}
