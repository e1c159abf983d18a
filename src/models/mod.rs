// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod run;
pub mod settings;
pub mod shoe;
pub mod stats;

pub use run::{HeartRateSummary, Lap, LocationSample, Run, RunMetadata, Weather};
pub use settings::Settings;
pub use shoe::{NewShoe, Shoe, ShoeUpdate, ShoeUsage};
pub use stats::{MonthlyUsage, Pace, RunStats, ShoeShare, ShoeStats, StatsPeriod, UsageTrend};
