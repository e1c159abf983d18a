// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar bucketing.

use chrono::{DateTime, Datelike, Months, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// "YYYY-MM" bucket key for a timestamp.
pub fn month_key(date: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// First day of the month containing `date`.
pub fn month_start(date: DateTime<Utc>) -> NaiveDate {
    // Day 1 always exists
    date.date_naive().with_day(1).unwrap_or(date.date_naive())
}

/// The last `count` calendar months ending with the month of `now`, oldest first.
pub fn trailing_months(now: DateTime<Utc>, count: u32) -> Vec<NaiveDate> {
    let current = month_start(now);
    (0..count)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .collect()
}

/// "YYYY-MM" key for a month-start date.
pub fn month_key_for_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
