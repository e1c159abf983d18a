// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shoe inventory model and derived usage aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::models::Run;
use crate::time_utils::month_key;

/// Reason recorded when a shoe crosses its configured maximum distance.
pub const AUTO_RETIRE_REASON: &str = "Automatically retired: Reached maximum distance";

/// A tracked pair of shoes.
///
/// `is_active` is false exactly when `retirement_date` is set; only
/// [`Shoe::retire`] and [`Shoe::unretire`] touch those fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Shoe {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub purchase_date: Option<NaiveDate>,
    /// Retirement threshold in km; 0 means no limit
    pub max_distance: f64,
    pub is_active: bool,
    pub retirement_date: Option<DateTime<Utc>>,
    pub retirement_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Shoe {
    pub fn from_new(new: NewShoe, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            brand: new.brand.trim().to_string(),
            model: new.model.trim().to_string(),
            purchase_date: new.purchase_date,
            max_distance: new.max_distance,
            is_active: true,
            retirement_date: None,
            retirement_reason: None,
            notes: new.notes,
            created_at: now,
        }
    }

    /// Whether a retirement threshold is configured.
    pub fn is_capped(&self) -> bool {
        self.max_distance > 0.0
    }

    pub fn retire(&mut self, reason: &str, now: DateTime<Utc>) {
        self.is_active = false;
        self.retirement_date = Some(now);
        self.retirement_reason = Some(reason.to_string());
    }

    pub fn unretire(&mut self) {
        self.is_active = true;
        self.retirement_date = None;
        self.retirement_reason = None;
    }

    /// Apply a partial update. Retirement state is never touched here.
    pub fn apply_update(&mut self, update: &ShoeUpdate) {
        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(brand) = &update.brand {
            self.brand = brand.trim().to_string();
        }
        if let Some(model) = &update.model {
            self.model = model.trim().to_string();
        }
        if let Some(purchase_date) = update.purchase_date {
            self.purchase_date = Some(purchase_date);
        }
        if let Some(max_distance) = update.max_distance {
            self.max_distance = max_distance;
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
    }
}

/// Input for adding a shoe.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewShoe {
    #[validate(length(min = 1, max = 100, message = "Shoe name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub brand: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub model: String,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(
        min = 0.0,
        max = 10000.0,
        message = "Maximum distance must be between 0 and 10000 km"
    ))]
    pub max_distance: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial shoe update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShoeUpdate {
    #[validate(length(min = 1, max = 100, message = "Shoe name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    #[validate(range(
        min = 0.0,
        max = 10000.0,
        message = "Maximum distance must be between 0 and 10000 km"
    ))]
    pub max_distance: Option<f64>,
    pub notes: Option<String>,
}

/// Accumulated mileage for one shoe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShoeUsage {
    /// Total kilometers
    #[serde(default)]
    pub total: f64,
    /// Kilometers per "YYYY-MM"
    #[serde(default)]
    pub monthly: BTreeMap<String, f64>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

impl ShoeUsage {
    /// Add one run's distance.
    pub fn record_run(&mut self, run: &Run) {
        self.total += run.distance;
        *self
            .monthly
            .entry(month_key(run.start_time))
            .or_insert(0.0) += run.distance;

        self.last_used = match self.last_used {
            Some(last) if last >= run.start_time => Some(last),
            _ => Some(run.start_time),
        };
    }

    /// Rebuild usage from scratch for the given runs.
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a Run>) -> Self {
        let mut usage = Self::default();
        for run in runs {
            usage.record_run(run);
        }
        usage
    }
}
