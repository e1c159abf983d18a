// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Optional heart-rate provider and training-load helpers.
//!
//! The provider is platform-gated. Every failure is treated as "feature
//! unavailable": logged, never propagated.

use chrono::{DateTime, Utc};

use crate::models::{HeartRateSummary, Run, Settings};

/// One heart-rate reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartRateSample {
    pub bpm: u32,
    pub timestamp: DateTime<Utc>,
}

/// Platform health store (HealthKit, Health Connect, ...).
pub trait BiometricProvider: Send + Sync {
    fn initialize(&self) -> Result<(), BiometricError>;

    fn heart_rate_samples(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HeartRateSample>, BiometricError>;

    fn save_workout(&self, run: &Run) -> Result<(), BiometricError>;
}

/// Errors from a biometric provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BiometricError {
    #[error("Biometric provider unavailable")]
    Unavailable,

    #[error("Biometric provider error: {0}")]
    Provider(String),
}

/// Provider for platforms without a health store.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBiometrics;

impl BiometricProvider for UnavailableBiometrics {
    fn initialize(&self) -> Result<(), BiometricError> {
        Err(BiometricError::Unavailable)
    }

    fn heart_rate_samples(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<HeartRateSample>, BiometricError> {
        Err(BiometricError::Unavailable)
    }

    fn save_workout(&self, _run: &Run) -> Result<(), BiometricError> {
        Err(BiometricError::Unavailable)
    }
}

/// Banister TRIMP: `minutes * HRr * 0.64 * e^(1.92 * HRr)`.
///
/// Returns `None` when the heart-rate bounds are unusable.
pub fn trimp(duration_secs: u64, avg_hr: u32, resting_hr: u32, max_hr: u32) -> Option<f64> {
    if max_hr <= resting_hr {
        return None;
    }
    let reserve = (avg_hr as f64 - resting_hr as f64) / (max_hr as f64 - resting_hr as f64);
    let reserve = reserve.clamp(0.0, 1.0);
    let minutes = duration_secs as f64 / 60.0;
    Some(minutes * reserve * 0.64 * (1.92 * reserve).exp())
}

/// Summarize samples into average/max and TRIMP when settings allow.
pub fn summarize(
    samples: &[HeartRateSample],
    duration_secs: u64,
    settings: &Settings,
) -> Option<HeartRateSummary> {
    if samples.is_empty() {
        return None;
    }
    let total: u64 = samples.iter().map(|s| s.bpm as u64).sum();
    let average = (total as f64 / samples.len() as f64).round() as u32;
    let max = samples.iter().map(|s| s.bpm).max().unwrap_or(average);

    let trimp = settings
        .heart_rate_bounds()
        .and_then(|(rest, max_hr)| trimp(duration_secs, average, rest, max_hr));

    Some(HeartRateSummary {
        average,
        max,
        trimp,
    })
}

/// Attach heart-rate data to a finished run.
///
/// Returns whether the provider is available. Provider failures are logged
/// and otherwise ignored.
pub fn enrich(provider: &dyn BiometricProvider, run: &mut Run, settings: &Settings) -> bool {
    if let Err(e) = provider.initialize() {
        tracing::debug!(error = %e, "Biometrics unavailable, skipping heart rate");
        return false;
    }

    let end = run.end_time.unwrap_or(run.start_time);
    match provider.heart_rate_samples(run.start_time, end) {
        Ok(samples) => {
            run.heart_rate = summarize(&samples, run.duration, settings);
        }
        Err(e) => {
            tracing::warn!(run_id = %run.id, error = %e, "Failed to read heart rate samples");
        }
    }
    true
}

/// Mirror a stored run to the health store. Failures are logged.
pub fn export_workout(provider: &dyn BiometricProvider, run: &Run) {
    if let Err(e) = provider.save_workout(run) {
        tracing::warn!(run_id = %run.id, error = %e, "Failed to export workout");
    }
}
