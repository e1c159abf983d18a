// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// One GPS fix delivered by the location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Meters above sea level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// A user-marked split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Lap {
    /// Kilometers covered since the previous lap
    pub distance: f64,
    /// Active seconds since the previous lap
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Weather {
    /// Degrees Celsius
    pub temperature: Option<f64>,
    pub conditions: Option<String>,
}

/// Heart-rate summary attached when a biometric provider had data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HeartRateSummary {
    pub average: u32,
    pub max: u32,
    /// Banister training impulse
    pub trimp: Option<f64>,
}

/// A tracked run. Distances are kilometers, durations seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Run {
    pub id: String,
    pub start_time: DateTime<Utc>,
    /// Final end once stopped; the pause instant while paused
    pub end_time: Option<DateTime<Utc>>,
    pub distance: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration: u64,
    /// Seconds per kilometer (0 until distance is covered)
    pub pace: f64,
    #[serde(default)]
    pub path: Vec<LocationSample>,
    #[serde(default)]
    pub laps: Vec<Lap>,
    pub shoe_id: Option<String>,
    #[serde(default)]
    pub is_paused: bool,

    // ─── Save Metadata ───────────────────────────────────────────
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub weather: Option<Weather>,
    /// Perceived effort, 1-10
    #[serde(default)]
    pub effort: Option<u8>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub heart_rate: Option<HeartRateSummary>,
}

impl Run {
    /// Create an empty draft starting at `start_time`.
    pub fn new_draft(start_time: DateTime<Utc>, shoe_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start_time,
            end_time: None,
            distance: 0.0,
            duration: 0,
            pace: 0.0,
            path: Vec::new(),
            laps: Vec::new(),
            shoe_id,
            is_paused: false,
            name: None,
            notes: None,
            weather: None,
            effort: None,
            mood: None,
            heart_rate: None,
        }
    }

    /// Recompute pace from the current distance and duration.
    pub fn refresh_pace(&mut self) {
        self.pace = pace_seconds_per_km(self.distance, self.duration);
    }

    /// Apply user-entered metadata. Fields left `None` keep their value.
    pub fn apply_metadata(&mut self, metadata: &RunMetadata) {
        if let Some(name) = &metadata.name {
            self.name = Some(name.clone());
        }
        if let Some(notes) = &metadata.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(shoe_id) = &metadata.shoe_id {
            self.shoe_id = Some(shoe_id.clone());
        }
        if let Some(weather) = &metadata.weather {
            self.weather = Some(weather.clone());
        }
        if let Some(effort) = metadata.effort {
            self.effort = Some(effort);
        }
        if let Some(mood) = &metadata.mood {
            self.mood = Some(mood.clone());
        }
    }
}

/// Seconds per kilometer, or 0 when no distance has been covered.
pub fn pace_seconds_per_km(distance_km: f64, duration_secs: u64) -> f64 {
    if distance_km > 0.0 {
        duration_secs as f64 / distance_km
    } else {
        0.0
    }
}

/// User-entered details merged into a run on save (or edited later).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunMetadata {
    #[validate(length(max = 100, message = "Run name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
    pub shoe_id: Option<String>,
    pub weather: Option<Weather>,
    #[validate(range(min = 1, max = 10, message = "Effort must be between 1 and 10"))]
    pub effort: Option<u8>,
    #[validate(length(max = 50, message = "Mood must be at most 50 characters"))]
    pub mood: Option<String>,
}
