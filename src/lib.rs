// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StrideSync: run tracking, shoe mileage and running statistics
//!
//! This crate provides the core engine (statistics, shoe retirement, the
//! live run session) and a JSON API over it for the mobile and web clients.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod units;

use clock::SharedClock;
use config::Config;
use db::KvStore;
use services::{
    BiometricProvider, ChannelLocationProvider, RunTracker, SharedStore, StrideStore,
    UnavailableBiometrics,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    pub tracker: RunTracker,
    /// GPS bridge fed by `POST /api/session/location`
    pub location: ChannelLocationProvider,
    pub clock: SharedClock,
}

impl AppState {
    /// Load the store from `kv` and wire up the tracker.
    pub async fn build(
        config: Config,
        kv: KvStore,
        clock: SharedClock,
        location: ChannelLocationProvider,
    ) -> Self {
        Self::build_with_biometrics(config, kv, clock, location, Arc::new(UnavailableBiometrics))
            .await
    }

    pub async fn build_with_biometrics(
        config: Config,
        kv: KvStore,
        clock: SharedClock,
        location: ChannelLocationProvider,
        biometrics: Arc<dyn BiometricProvider>,
    ) -> Self {
        let store = StrideStore::load(kv, &config, clock.clone()).await;
        let store: SharedStore = Arc::new(tokio::sync::Mutex::new(store));
        let tracker = RunTracker::new(
            Arc::new(location.clone()),
            biometrics,
            store.clone(),
            clock.clone(),
        );

        Self {
            config,
            store,
            tracker,
            location,
            clock,
        }
    }
}
