// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved runs, route export and run statistics.

use crate::error::{AppError, Result};
use crate::models::settings::DistanceUnit;
use crate::models::{Run, RunMetadata, RunStats, StatsPeriod, UsageTrend};
use crate::services::route::{encode_path, route_feature};
use crate::units::{format_distance, format_duration, format_pace};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest usage-trend series a client may ask for.
const MAX_TREND_PERIODS: u32 = 60;
const DEFAULT_TREND_PERIODS: u32 = 6;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/runs", get(list_runs))
        .route(
            "/api/runs/{id}",
            get(get_run).patch(update_run).delete(delete_run),
        )
        .route("/api/runs/{id}/route", get(get_run_route))
        .route("/api/stats/runs", get(get_run_stats))
        .route("/api/stats/trends", get(get_usage_trends))
}

// ─── Runs ────────────────────────────────────────────────────

/// Run list entry with display strings in the user's units.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunSummary {
    pub id: String,
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub shoe_id: Option<String>,
    pub distance: f64,
    pub duration: u64,
    pub lap_count: usize,
    pub distance_display: String,
    pub duration_display: String,
    pub pace_display: String,
    /// Encoded path, absent for indoor runs
    pub polyline: Option<String>,
}

impl RunSummary {
    pub fn from_run(run: &Run, unit: DistanceUnit) -> Self {
        let polyline = if run.path.len() >= 2 {
            encode_path(&run.path)
                .map_err(|e| tracing::warn!(run_id = %run.id, error = %e, "Polyline failed"))
                .ok()
        } else {
            None
        };

        Self {
            id: run.id.clone(),
            name: run.name.clone(),
            start_time: run.start_time,
            shoe_id: run.shoe_id.clone(),
            distance: run.distance,
            duration: run.duration,
            lap_count: run.laps.len(),
            distance_display: format_distance(run.distance, unit),
            duration_display: format_duration(run.duration),
            pace_display: format_pace(run.pace, unit),
            polyline,
        }
    }
}

#[derive(Deserialize)]
struct RunsQuery {
    /// Only runs worn with this shoe
    shoe_id: Option<String>,
}

async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Json<Vec<RunSummary>> {
    let store = state.store.lock().await;
    let unit = store.settings().distance_unit;

    let summaries = store
        .runs()
        .iter()
        .filter(|run| match &query.shoe_id {
            Some(shoe_id) => run.shoe_id.as_ref() == Some(shoe_id),
            None => true,
        })
        .map(|run| RunSummary::from_run(run, unit))
        .collect();
    Json(summaries)
}

async fn get_run(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Run>> {
    let store = state.store.lock().await;
    store
        .get_run(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| run_not_found(&id))
}

async fn update_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(metadata): Json<RunMetadata>,
) -> Result<Json<Run>> {
    let mut store = state.store.lock().await;
    store
        .update_run(&id, &metadata)?
        .map(Json)
        .ok_or_else(|| run_not_found(&id))
}

async fn delete_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let mut store = state.store.lock().await;
    if store.delete_run(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(run_not_found(&id))
    }
}

/// GeoJSON feature for the run's path.
async fn get_run_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<geojson::Feature>> {
    let store = state.store.lock().await;
    let run = store.get_run(&id).ok_or_else(|| run_not_found(&id))?;
    Ok(Json(route_feature(run)))
}

fn run_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Run {} not found", id))
}

// ─── Statistics ──────────────────────────────────────────────

#[derive(Deserialize)]
struct StatsQuery {
    #[serde(default)]
    period: StatsPeriod,
}

async fn get_run_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Json<RunStats> {
    let store = state.store.lock().await;
    Json(store.get_run_stats(query.period))
}

#[derive(Deserialize)]
struct TrendsQuery {
    periods: Option<u32>,
}

async fn get_usage_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<Vec<UsageTrend>>> {
    let periods = query.periods.unwrap_or(DEFAULT_TREND_PERIODS);
    if periods == 0 || periods > MAX_TREND_PERIODS {
        return Err(AppError::BadRequest(format!(
            "periods must be between 1 and {}",
            MAX_TREND_PERIODS
        )));
    }

    let store = state.store.lock().await;
    let trends = store.get_shoe_usage_trends(periods);
    Ok(Json(trends.as_ref().clone()))
}
