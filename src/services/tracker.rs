// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live run tracking around the session state machine.
//!
//! While a run is active two tasks feed the session:
//! - a pump draining the location watch into `append_location`
//! - a 1 s interval refreshing the displayed duration
//!
//! Leaving the active state removes the watch and aborts both tasks before
//! the transition returns.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use validator::Validate;

use crate::clock::SharedClock;
use crate::error::Result;
use crate::models::{Lap, Run, RunMetadata};
use crate::services::biometrics::{self, BiometricProvider};
use crate::services::location::{
    LocationEvent, LocationProvider, PermissionStatus, Subscription, WatchOptions,
};
use crate::services::session::{RunSession, SessionStatus, StartRun};
use crate::services::store::SharedStore;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What the UI shows for the current session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub run: Option<Run>,
    /// True when tracking without GPS
    pub indoor: bool,
}

struct TrackerInner {
    session: RunSession,
    sampling: Option<Sampling>,
    indoor: bool,
}

/// Background work attached to an active run.
struct Sampling {
    subscription: Option<Subscription>,
    pump: Option<JoinHandle<()>>,
    tick: JoinHandle<()>,
}

impl Sampling {
    fn cancel(self) {
        if let Some(subscription) = self.subscription {
            subscription.remove();
        }
        if let Some(pump) = self.pump {
            pump.abort();
        }
        self.tick.abort();
    }
}

/// Owns the session and its sampling tasks. Cheap to clone.
#[derive(Clone)]
pub struct RunTracker {
    inner: Arc<Mutex<TrackerInner>>,
    location: Arc<dyn LocationProvider>,
    biometrics: Arc<dyn BiometricProvider>,
    store: SharedStore,
    clock: SharedClock,
}

impl RunTracker {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        biometrics: Arc<dyn BiometricProvider>,
        store: SharedStore,
        clock: SharedClock,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerInner {
                session: RunSession::Idle,
                sampling: None,
                indoor: false,
            })),
            location,
            biometrics,
            store,
            clock,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        snapshot_of(&inner)
    }

    /// Start a run. Without location permission the run is tracked indoors.
    pub async fn start(&self, options: StartRun) -> Result<SessionSnapshot> {
        let accuracy = self.store.lock().await.settings().gps_accuracy;
        let mut inner = self.inner.lock().await;

        inner.session.start(options, self.clock.now())?;
        self.begin_sampling(&mut inner, WatchOptions::for_accuracy(accuracy));
        Ok(snapshot_of(&inner))
    }

    pub async fn pause(&self) -> Result<SessionSnapshot> {
        let mut inner = self.inner.lock().await;
        inner.session.pause(self.clock.now())?;
        end_sampling(&mut inner);
        Ok(snapshot_of(&inner))
    }

    pub async fn resume(&self) -> Result<SessionSnapshot> {
        let accuracy = self.store.lock().await.settings().gps_accuracy;
        let mut inner = self.inner.lock().await;

        inner.session.resume(self.clock.now())?;
        self.begin_sampling(&mut inner, WatchOptions::for_accuracy(accuracy));
        Ok(snapshot_of(&inner))
    }

    pub async fn add_lap(&self) -> Result<Lap> {
        let mut inner = self.inner.lock().await;
        Ok(inner.session.add_lap(self.clock.now())?)
    }

    pub async fn stop(&self) -> Result<SessionSnapshot> {
        let mut inner = self.inner.lock().await;
        // Sampling tasks need the lock, so none can run between these two
        inner.session.stop(self.clock.now())?;
        end_sampling(&mut inner);
        Ok(snapshot_of(&inner))
    }

    /// Persist the completed run with `metadata` and return to idle.
    ///
    /// Heart rate is attached when a biometric provider is available. If the
    /// store rejects the run the draft stays completed so the save can be
    /// retried.
    pub async fn save(&self, metadata: RunMetadata) -> Result<Run> {
        metadata.validate()?;
        let mut inner = self.inner.lock().await;
        let mut run = inner.session.prepare_save(&metadata)?;

        let mut store = self.store.lock().await;
        let biometrics_ready =
            biometrics::enrich(self.biometrics.as_ref(), &mut run, store.settings());
        let saved = store.save_run(run)?;
        drop(store);

        // Only runs the store accepted reach the health store
        if biometrics_ready {
            biometrics::export_workout(self.biometrics.as_ref(), &saved);
        }

        inner.session.finish_save()?;
        Ok(saved)
    }

    pub async fn discard(&self) -> Result<SessionSnapshot> {
        let mut inner = self.inner.lock().await;
        inner.session.discard()?;
        end_sampling(&mut inner);
        Ok(snapshot_of(&inner))
    }

    fn begin_sampling(&self, inner: &mut TrackerInner, options: WatchOptions) {
        end_sampling(inner);

        let (subscription, pump) = match self.location.request_permission() {
            PermissionStatus::Denied => {
                tracing::info!("Location permission denied, tracking indoors");
                inner.indoor = true;
                (None, None)
            }
            PermissionStatus::Granted => match self.location.watch(options) {
                Ok(watch) => {
                    inner.indoor = false;
                    let pump = self.spawn_pump(watch.events);
                    (Some(watch.subscription), Some(pump))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Location watch failed, tracking indoors");
                    inner.indoor = true;
                    (None, None)
                }
            },
        };

        inner.sampling = Some(Sampling {
            subscription,
            pump,
            tick: self.spawn_tick(),
        });
    }

    fn spawn_pump(&self, mut events: UnboundedReceiver<LocationEvent>) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let clock = self.clock.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    Ok(sample) => {
                        let mut inner = inner.lock().await;
                        if let Err(e) = inner.session.append_location(sample, clock.now()) {
                            tracing::debug!(error = %e, "Dropped location sample");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Location error");
                    }
                }
            }
        })
    }

    fn spawn_tick(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let clock = self.clock.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                inner.lock().await.session.tick(clock.now());
            }
        })
    }
}

fn end_sampling(inner: &mut TrackerInner) {
    if let Some(sampling) = inner.sampling.take() {
        sampling.cancel();
    }
}

fn snapshot_of(inner: &TrackerInner) -> SessionSnapshot {
    SessionSnapshot {
        status: inner.session.status(),
        run: inner.session.run().cloned(),
        indoor: inner.indoor,
    }
}
