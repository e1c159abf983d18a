// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live run session controls.

use crate::error::{AppError, Result};
use crate::models::{Lap, LocationSample, Run, RunMetadata};
use crate::services::{SessionSnapshot, StartRun};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/start", post(start))
        .route("/api/session/location", post(push_location))
        .route("/api/session/pause", post(pause))
        .route("/api/session/resume", post(resume))
        .route("/api/session/lap", post(add_lap))
        .route("/api/session/stop", post(stop))
        .route("/api/session/save", post(save))
        .route("/api/session/discard", post(discard))
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.tracker.snapshot().await)
}

async fn start(
    State(state): State<Arc<AppState>>,
    Json(options): Json<StartRun>,
) -> Result<Json<SessionSnapshot>> {
    if let Some(shoe_id) = options.shoe_id.as_deref() {
        if state.store.lock().await.get_shoe(shoe_id).is_none() {
            return Err(AppError::BadRequest(format!("Unknown shoe {}", shoe_id)));
        }
    }
    Ok(Json(state.tracker.start(options).await?))
}

/// GPS fix from the device, forwarded to the active location watch.
async fn push_location(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<LocationSample>,
) -> Result<StatusCode> {
    if !(-90.0..=90.0).contains(&sample.latitude) || !(-180.0..=180.0).contains(&sample.longitude)
    {
        return Err(AppError::BadRequest(
            "Coordinates out of range".to_string(),
        ));
    }

    if state.location.push(sample) {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(AppError::Conflict("No active location watch".to_string()))
    }
}

async fn pause(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>> {
    Ok(Json(state.tracker.pause().await?))
}

async fn resume(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>> {
    Ok(Json(state.tracker.resume().await?))
}

async fn add_lap(State(state): State<Arc<AppState>>) -> Result<Json<Lap>> {
    Ok(Json(state.tracker.add_lap().await?))
}

async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>> {
    Ok(Json(state.tracker.stop().await?))
}

async fn save(
    State(state): State<Arc<AppState>>,
    Json(metadata): Json<RunMetadata>,
) -> Result<(StatusCode, Json<Run>)> {
    let run = state.tracker.save(metadata).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

async fn discard(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>> {
    Ok(Json(state.tracker.discard().await?))
}
