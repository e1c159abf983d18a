// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User settings and store status.

use crate::error::Result;
use crate::models::Settings;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/status", get(get_status))
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.store.lock().await.settings().clone())
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>> {
    let mut store = state.store.lock().await;
    Ok(Json(store.update_settings(settings)?))
}

/// Store health as seen by the client.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    /// "ok" or "degraded"
    pub status: String,
    /// Last load or persistence failure
    pub error: Option<String>,
    pub runs: usize,
    pub shoes: usize,
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let store = state.store.lock().await;
    let error = store.error();
    Json(StatusResponse {
        status: if error.is_some() { "degraded" } else { "ok" }.to_string(),
        error,
        runs: store.runs().len(),
        shoes: store.get_shoes().len(),
    })
}
