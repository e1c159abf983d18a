// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run session state machine.
//!
//! Owns the draft of the run currently being tracked:
//!
//! ```text
//! Idle -> Active <-> Paused
//!           |          |
//!           +-> Completed -> (save) Idle
//! Active | Paused | Completed -> (discard) Idle
//! ```
//!
//! Every transition takes `now` explicitly. Active time is computed as
//! `now - anchor`, where the anchor starts at the run's start time and is
//! pushed forward by each pause, so paused wall-clock time never counts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Lap, LocationSample, Run, RunMetadata};
use crate::services::route::segment_distance_km;

/// Options for starting a run.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct StartRun {
    pub shoe_id: Option<String>,
    pub name: Option<String>,
}

/// Externally visible state name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Active,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }
}

/// The session, as a sum type so status and draft can never disagree.
#[derive(Debug, Clone, Default)]
pub enum RunSession {
    #[default]
    Idle,
    Active {
        run: Run,
        /// Start time shifted forward by all paused intervals
        anchor: DateTime<Utc>,
    },
    Paused {
        run: Run,
        anchor: DateTime<Utc>,
    },
    Completed {
        run: Run,
    },
}

impl RunSession {
    pub fn status(&self) -> SessionStatus {
        match self {
            RunSession::Idle => SessionStatus::Idle,
            RunSession::Active { .. } => SessionStatus::Active,
            RunSession::Paused { .. } => SessionStatus::Paused,
            RunSession::Completed { .. } => SessionStatus::Completed,
        }
    }

    /// The current draft, if any.
    pub fn run(&self) -> Option<&Run> {
        match self {
            RunSession::Idle => None,
            RunSession::Active { run, .. }
            | RunSession::Paused { run, .. }
            | RunSession::Completed { run } => Some(run),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RunSession::Active { .. })
    }

    /// Idle -> Active with a fresh draft.
    pub fn start(&mut self, options: StartRun, now: DateTime<Utc>) -> Result<(), SessionError> {
        if !matches!(self, RunSession::Idle) {
            return Err(invalid(self.status(), "start"));
        }

        let mut run = Run::new_draft(now, options.shoe_id);
        run.name = options.name;
        tracing::info!(run_id = %run.id, "Run started");

        *self = RunSession::Active { run, anchor: now };
        Ok(())
    }

    /// Append a GPS sample to the active run.
    pub fn append_location(
        &mut self,
        sample: LocationSample,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let status = self.status();
        let RunSession::Active { run, anchor } = self else {
            return Err(invalid(status, "append_location"));
        };

        if let Some(previous) = run.path.last() {
            run.distance += segment_distance_km(previous, &sample);
        }
        run.path.push(sample);
        run.duration = active_seconds(*anchor, now);
        run.refresh_pace();
        Ok(())
    }

    /// Refresh the live duration. Extra or early ticks are harmless.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if let RunSession::Active { run, anchor } = self {
            run.duration = active_seconds(*anchor, now);
            run.refresh_pace();
        }
    }

    /// Active -> Paused. Duration is frozen and `end_time` marks the pause.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match std::mem::take(self) {
            RunSession::Active { mut run, anchor } => {
                run.duration = active_seconds(anchor, now);
                run.refresh_pace();
                run.end_time = Some(now);
                run.is_paused = true;
                tracing::debug!(run_id = %run.id, duration = run.duration, "Run paused");
                *self = RunSession::Paused { run, anchor };
                Ok(())
            }
            other => {
                *self = other;
                Err(invalid(self.status(), "pause"))
            }
        }
    }

    /// Paused -> Active. The anchor moves forward by the paused interval.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match std::mem::take(self) {
            RunSession::Paused { mut run, anchor } => {
                let paused_at = run.end_time.unwrap_or(now);
                let paused_for = (now - paused_at).max(chrono::Duration::zero());
                run.end_time = None;
                run.is_paused = false;
                tracing::debug!(
                    run_id = %run.id,
                    paused_secs = paused_for.num_seconds(),
                    "Run resumed"
                );
                *self = RunSession::Active {
                    run,
                    anchor: anchor + paused_for,
                };
                Ok(())
            }
            other => {
                *self = other;
                Err(invalid(self.status(), "resume"))
            }
        }
    }

    /// Record a lap covering everything since the previous lap.
    pub fn add_lap(&mut self, now: DateTime<Utc>) -> Result<Lap, SessionError> {
        let status = self.status();
        let RunSession::Active { run, anchor } = self else {
            return Err(invalid(status, "add_lap"));
        };

        run.duration = active_seconds(*anchor, now);
        run.refresh_pace();

        let lapped_distance: f64 = run.laps.iter().map(|lap| lap.distance).sum();
        let lapped_duration: u64 = run.laps.iter().map(|lap| lap.duration).sum();
        let lap = Lap {
            distance: (run.distance - lapped_distance).max(0.0),
            duration: run.duration.saturating_sub(lapped_duration),
        };
        run.laps.push(lap.clone());
        tracing::debug!(run_id = %run.id, lap = run.laps.len(), "Lap recorded");

        Ok(lap)
    }

    /// Active | Paused -> Completed, with the final end time.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let run = match std::mem::take(self) {
            RunSession::Active { mut run, anchor } => {
                run.duration = active_seconds(anchor, now);
                run.refresh_pace();
                run.end_time = Some(now);
                run
            }
            RunSession::Paused { mut run, .. } => {
                // Duration was frozen at the pause
                run.end_time = Some(now);
                run.is_paused = false;
                run
            }
            other => {
                *self = other;
                return Err(invalid(self.status(), "stop"));
            }
        };

        tracing::info!(
            run_id = %run.id,
            distance_km = run.distance,
            duration = run.duration,
            "Run stopped"
        );
        *self = RunSession::Completed { run };
        Ok(())
    }

    /// The completed run with `metadata` merged in, without releasing it.
    ///
    /// Callers persist the returned run and then call [`RunSession::finish_save`],
    /// so a failed write leaves the draft in place to retry.
    pub fn prepare_save(&self, metadata: &RunMetadata) -> Result<Run, SessionError> {
        match self {
            RunSession::Completed { run } => {
                let mut run = run.clone();
                run.apply_metadata(metadata);
                Ok(run)
            }
            _ => Err(invalid(self.status(), "save")),
        }
    }

    /// Completed -> Idle after a successful save.
    pub fn finish_save(&mut self) -> Result<(), SessionError> {
        if !matches!(self, RunSession::Completed { .. }) {
            return Err(invalid(self.status(), "save"));
        }
        *self = RunSession::Idle;
        Ok(())
    }

    /// Save in one step: merge metadata, release the draft and return it.
    pub fn save(&mut self, metadata: &RunMetadata) -> Result<Run, SessionError> {
        let run = self.prepare_save(metadata)?;
        self.finish_save()?;
        Ok(run)
    }

    /// Drop the draft without persisting it.
    pub fn discard(&mut self) -> Result<Run, SessionError> {
        match std::mem::take(self) {
            RunSession::Idle => Err(invalid(SessionStatus::Idle, "discard")),
            RunSession::Active { run, .. }
            | RunSession::Paused { run, .. }
            | RunSession::Completed { run } => {
                tracing::info!(run_id = %run.id, "Run discarded");
                Ok(run)
            }
        }
    }
}

fn invalid(status: SessionStatus, action: &'static str) -> SessionError {
    SessionError::InvalidTransition {
        from: status.as_str(),
        action,
    }
}

fn active_seconds(anchor: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - anchor).num_seconds().max(0) as u64
}

/// Errors from session transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
}
