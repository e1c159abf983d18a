// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location provider boundary.
//!
//! The platform delivers GPS fixes through a channel rather than callbacks.
//! A watch hands back the receiving end plus a [`Subscription`]; removing
//! (or dropping) the subscription stops delivery.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::models::settings::GpsAccuracy;
use crate::models::LocationSample;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// How often and how precisely to sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub accuracy: GpsAccuracy,
    /// Minimum meters between fixes
    pub distance_interval_m: f64,
    pub time_interval: Duration,
}

impl WatchOptions {
    pub fn for_accuracy(accuracy: GpsAccuracy) -> Self {
        let (distance_interval_m, time_interval) = match accuracy {
            GpsAccuracy::High => (5.0, Duration::from_secs(1)),
            GpsAccuracy::Balanced => (10.0, Duration::from_secs(3)),
            GpsAccuracy::Low => (25.0, Duration::from_secs(5)),
        };
        Self {
            accuracy,
            distance_interval_m,
            time_interval,
        }
    }
}

/// A sample or a transient provider error.
pub type LocationEvent = Result<LocationSample, LocationError>;

/// Cancels a watch on `remove()` or drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn remove(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// An open location watch.
#[derive(Debug)]
pub struct LocationWatch {
    pub events: mpsc::UnboundedReceiver<LocationEvent>,
    pub subscription: Subscription,
}

/// Source of GPS fixes.
pub trait LocationProvider: Send + Sync {
    fn request_permission(&self) -> PermissionStatus;

    fn watch(&self, options: WatchOptions) -> Result<LocationWatch, LocationError>;
}

/// Errors reported by a location provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

type SenderSlot = Arc<Mutex<Option<mpsc::UnboundedSender<LocationEvent>>>>;

/// Provider fed by whoever holds a handle to it: the HTTP bridge from the
/// mobile client, a replayed GPX track, or a test.
#[derive(Clone)]
pub struct ChannelLocationProvider {
    permission: Arc<Mutex<PermissionStatus>>,
    sender: SenderSlot,
}

impl Default for ChannelLocationProvider {
    fn default() -> Self {
        Self::new(PermissionStatus::Granted)
    }
}

impl ChannelLocationProvider {
    pub fn new(permission: PermissionStatus) -> Self {
        Self {
            permission: Arc::new(Mutex::new(permission)),
            sender: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner()) = permission;
    }

    /// Deliver a sample to the current watch. Returns false when nobody is watching.
    pub fn push(&self, sample: LocationSample) -> bool {
        self.send(Ok(sample))
    }

    /// Deliver a transient error to the current watch.
    pub fn push_error(&self, error: LocationError) -> bool {
        self.send(Err(error))
    }

    pub fn is_watching(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    fn send(&self, event: LocationEvent) -> bool {
        let slot = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

impl LocationProvider for ChannelLocationProvider {
    fn request_permission(&self) -> PermissionStatus {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn watch(&self, options: WatchOptions) -> Result<LocationWatch, LocationError> {
        if self.request_permission() == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // A new watch replaces any previous one
        *self.sender.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        tracing::debug!(accuracy = ?options.accuracy, "Location watch started");

        let slot = self.sender.clone();
        let subscription = Subscription::new(move || {
            slot.lock().unwrap_or_else(|e| e.into_inner()).take();
            tracing::debug!("Location watch removed");
        });

        Ok(LocationWatch {
            events: rx,
            subscription,
        })
    }
}
