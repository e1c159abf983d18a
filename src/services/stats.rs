// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run and shoe statistics.
//!
//! Pure aggregation over a snapshot of the run list. The store wraps the
//! expensive selectors in its memo cache; nothing here holds state.

use chrono::{DateTime, Datelike, Duration, Months, Timelike, Utc, Weekday};
use std::collections::{BTreeMap, HashMap};

use crate::models::{
    MonthlyUsage, Pace, Run, RunStats, Shoe, ShoeShare, ShoeStats, StatsPeriod, UsageTrend,
};
use crate::time_utils::{month_key, month_key_for_date, trailing_months};

/// Average days per month, for run frequency.
const DAYS_PER_MONTH: f64 = 30.44;
const SECONDS_PER_DAY: f64 = 86_400.0;
const BREAKDOWN_MONTHS: u32 = 12;

/// Earliest start time included in `period`, or `None` for all time.
pub fn period_start(period: StatsPeriod, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match period {
        StatsPeriod::All => None,
        StatsPeriod::Week => Some(now - Duration::days(7)),
        StatsPeriod::Month => Some(now.checked_sub_months(Months::new(1)).unwrap_or(now)),
        StatsPeriod::Year => Some(now.checked_sub_months(Months::new(12)).unwrap_or(now)),
    }
}

/// Totals for runs that started within `[now - period, now]`.
pub fn run_stats(runs: &[Run], period: StatsPeriod, now: DateTime<Utc>) -> RunStats {
    let window = period_start(period, now);
    let in_period = runs.iter().filter(|run| match window {
        Some(start) => run.start_time >= start && run.start_time <= now,
        None => true,
    });

    let mut total_runs = 0u32;
    let mut total_distance = 0.0;
    let mut total_duration = 0u64;
    for run in in_period {
        total_runs += 1;
        total_distance += run.distance;
        total_duration += run.duration;
    }

    RunStats {
        total_runs,
        total_distance,
        total_duration,
        avg_pace: average_pace(total_distance, total_duration),
    }
}

/// Minutes/seconds per km, `None` without distance.
pub fn average_pace(total_distance: f64, total_duration: u64) -> Option<Pace> {
    if total_distance > 0.0 {
        Some(Pace::from_seconds(total_duration as f64 / total_distance))
    } else {
        None
    }
}

/// Derived statistics for one shoe over the full run list.
///
/// A shoe without runs still gets a fully populated record.
pub fn shoe_stats(shoe: &Shoe, runs: &[Run], now: DateTime<Utc>) -> ShoeStats {
    let mut shoe_runs: Vec<&Run> = runs
        .iter()
        .filter(|run| run.shoe_id.as_deref() == Some(shoe.id.as_str()))
        .collect();
    shoe_runs.sort_by_key(|run| run.start_time);

    let total_runs = shoe_runs.len() as u32;
    let total_distance: f64 = shoe_runs.iter().map(|run| run.distance).sum();
    let total_duration: u64 = shoe_runs.iter().map(|run| run.duration).sum();

    let mut distances: Vec<f64> = shoe_runs.iter().map(|run| run.distance).collect();
    distances.sort_by(|a, b| a.total_cmp(b));

    let average_distance = if total_runs > 0 {
        total_distance / total_runs as f64
    } else {
        0.0
    };

    let first_run = shoe_runs.first().map(|run| run.start_time);
    let last_run = shoe_runs.last().map(|run| run.start_time);

    // Frequency over the span between first and last run, at least one week/month
    let span_days = match (first_run, last_run) {
        (Some(first), Some(last)) => (last - first).num_seconds() as f64 / SECONDS_PER_DAY,
        _ => 0.0,
    };
    let weeks = (span_days / 7.0).max(1.0);
    let months = (span_days / DAYS_PER_MONTH).max(1.0);
    let (runs_per_week, runs_per_month, weekly_average) = if total_runs > 0 {
        (
            total_runs as f64 / weeks,
            total_runs as f64 / months,
            total_distance / weeks,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let capped = shoe.is_capped();
    let remaining_distance = capped.then(|| (shoe.max_distance - total_distance).max(0.0));
    let percentage_used = capped.then(|| total_distance / shoe.max_distance * 100.0);

    let estimated_remaining_runs = if capped && average_distance > 0.0 {
        Some((shoe.max_distance / average_distance).floor() as u64)
    } else {
        None
    };

    let estimated_retirement_date = match remaining_distance {
        Some(remaining) if weekly_average > 0.0 => {
            let remaining_weeks = remaining / weekly_average;
            let seconds = (remaining_weeks * 7.0 * SECONDS_PER_DAY).round();
            // `as` saturates; anything past chrono's range is reported as unknown
            Duration::try_seconds(seconds as i64).and_then(|delta| now.checked_add_signed(delta))
        }
        _ => None,
    };

    ShoeStats {
        shoe_id: shoe.id.clone(),
        total_runs,
        total_distance,
        total_duration,
        average_distance,
        median_distance: median(&distances),
        longest_run: distances.last().copied().unwrap_or(0.0),
        shortest_run: distances.first().copied().unwrap_or(0.0),
        first_run,
        last_run,
        runs_per_week,
        runs_per_month,
        weekly_average,
        monthly_breakdown: monthly_breakdown(&shoe_runs, now),
        most_common_day: most_common_weekday(&shoe_runs).map(weekday_name),
        most_common_hour: most_common_hour(&shoe_runs),
        max_distance: shoe.max_distance,
        remaining_distance,
        percentage_used,
        estimated_remaining_runs,
        estimated_retirement_date,
    }
}

/// Per-month shoe usage for the last `periods` calendar months, oldest first.
///
/// Only runs with a shoe assigned count toward the bucket totals. Empty
/// months are still returned so the series has exactly `periods` entries.
pub fn usage_trends(
    runs: &[Run],
    shoes: &[Shoe],
    periods: u32,
    now: DateTime<Utc>,
) -> Vec<UsageTrend> {
    let names: HashMap<&str, &str> = shoes
        .iter()
        .map(|shoe| (shoe.id.as_str(), shoe.name.as_str()))
        .collect();

    // month -> shoe -> (distance, runs)
    let mut buckets: HashMap<String, BTreeMap<&str, (f64, u32)>> = HashMap::new();
    for run in runs {
        if let Some(shoe_id) = run.shoe_id.as_deref() {
            let entry = buckets
                .entry(month_key(run.start_time))
                .or_default()
                .entry(shoe_id)
                .or_insert((0.0, 0));
            entry.0 += run.distance;
            entry.1 += 1;
        }
    }

    trailing_months(now, periods)
        .into_iter()
        .map(|month| {
            let period = month_key_for_date(month);
            let per_shoe = buckets.remove(&period).unwrap_or_default();

            let total_distance: f64 = per_shoe.values().map(|(d, _)| d).sum();
            let run_count: u32 = per_shoe.values().map(|(_, n)| n).sum();

            let mut shares: Vec<ShoeShare> = per_shoe
                .into_iter()
                .map(|(shoe_id, (distance, count))| ShoeShare {
                    shoe_id: shoe_id.to_string(),
                    shoe_name: names.get(shoe_id).unwrap_or(&"Unknown shoe").to_string(),
                    distance,
                    run_count: count,
                    percentage: if total_distance > 0.0 {
                        distance / total_distance * 100.0
                    } else {
                        0.0
                    },
                })
                .collect();
            shares.sort_by(|a, b| {
                b.distance
                    .total_cmp(&a.distance)
                    .then_with(|| a.shoe_name.cmp(&b.shoe_name))
            });

            UsageTrend {
                period,
                total_distance,
                run_count,
                shoes: shares,
            }
        })
        .collect()
}

fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn monthly_breakdown(runs: &[&Run], now: DateTime<Utc>) -> Vec<MonthlyUsage> {
    let mut by_month: HashMap<String, (f64, u32)> = HashMap::new();
    for run in runs {
        let entry = by_month.entry(month_key(run.start_time)).or_default();
        entry.0 += run.distance;
        entry.1 += 1;
    }

    trailing_months(now, BREAKDOWN_MONTHS)
        .into_iter()
        .map(|month| {
            let key = month_key_for_date(month);
            let (distance, runs) = by_month.get(&key).copied().unwrap_or_default();
            MonthlyUsage {
                month: key,
                distance,
                runs,
            }
        })
        .collect()
}

/// Highest count wins; ties go to the earlier slot.
fn argmax(counts: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (slot, &count) in counts.iter().enumerate() {
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((slot, count));
        }
    }
    best.map(|(slot, _)| slot)
}

fn most_common_weekday(runs: &[&Run]) -> Option<Weekday> {
    let mut counts = [0u32; 7];
    for run in runs {
        counts[run.start_time.weekday().num_days_from_monday() as usize] += 1;
    }
    argmax(&counts).and_then(|day| Weekday::try_from(day as u8).ok())
}

fn most_common_hour(runs: &[&Run]) -> Option<u32> {
    let mut counts = [0u32; 24];
    for run in runs {
        counts[run.start_time.hour() as usize] += 1;
    }
    argmax(&counts).map(|hour| hour as u32)
}

fn weekday_name(day: Weekday) -> String {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
    .to_string()
}
