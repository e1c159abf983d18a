// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod biometrics;
pub mod location;
pub mod memo;
pub mod route;
pub mod session;
pub mod stats;
pub mod store;
pub mod tracker;

pub use biometrics::{BiometricError, BiometricProvider, UnavailableBiometrics};
pub use location::{ChannelLocationProvider, LocationError, LocationProvider, PermissionStatus};
pub use memo::MemoCache;
pub use session::{RunSession, SessionError, SessionStatus, StartRun};
pub use store::{SharedStore, StrideStore};
pub use tracker::{RunTracker, SessionSnapshot};
