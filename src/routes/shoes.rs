// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shoe inventory, retirement and per-shoe statistics.

use crate::error::{AppError, Result};
use crate::models::{NewShoe, Shoe, ShoeStats, ShoeUpdate};
use crate::routes::runs::RunSummary;
use crate::services::StrideStore;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MANUAL_RETIRE_REASON: &str = "Retired manually";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/shoes", get(list_shoes).post(add_shoe))
        .route("/api/shoes/brands", get(get_brands))
        .route(
            "/api/shoes/{id}",
            get(get_shoe).patch(update_shoe).delete(delete_shoe),
        )
        .route("/api/shoes/{id}/retire", post(retire_shoe))
        .route("/api/shoes/{id}/unretire", post(unretire_shoe))
        .route("/api/shoes/{id}/stats", get(get_shoe_stats))
        .route("/api/shoes/{id}/runs", get(get_shoe_runs))
}

/// A shoe with its accumulated mileage.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShoeResponse {
    #[serde(flatten)]
    pub shoe: Shoe,
    pub total_distance: f64,
    /// Only for shoes with a maximum distance
    pub remaining_distance: Option<f64>,
    pub percentage_used: Option<f64>,
}

impl ShoeResponse {
    fn new(store: &StrideStore, shoe: Shoe) -> Self {
        let total_distance = store
            .get_shoe_usage(&shoe.id)
            .map(|usage| usage.total)
            .unwrap_or(0.0);
        let (remaining_distance, percentage_used) = if shoe.is_capped() {
            (
                Some((shoe.max_distance - total_distance).max(0.0)),
                Some(total_distance / shoe.max_distance * 100.0),
            )
        } else {
            (None, None)
        };

        Self {
            shoe,
            total_distance,
            remaining_distance,
            percentage_used,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ShoeFilter {
    #[default]
    All,
    Active,
    Retired,
}

#[derive(Deserialize)]
struct ShoesQuery {
    #[serde(default)]
    status: ShoeFilter,
}

async fn list_shoes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShoesQuery>,
) -> Json<Vec<ShoeResponse>> {
    let store = state.store.lock().await;
    let shoes = match query.status {
        ShoeFilter::All => store.get_shoes().to_vec(),
        ShoeFilter::Active => store.get_active_shoes(),
        ShoeFilter::Retired => store.get_retired_shoes(),
    };

    Json(
        shoes
            .into_iter()
            .map(|shoe| ShoeResponse::new(&store, shoe))
            .collect(),
    )
}

async fn add_shoe(
    State(state): State<Arc<AppState>>,
    Json(new_shoe): Json<NewShoe>,
) -> Result<(StatusCode, Json<ShoeResponse>)> {
    let mut store = state.store.lock().await;
    let shoe = store.add_shoe(new_shoe)?;
    Ok((StatusCode::CREATED, Json(ShoeResponse::new(&store, shoe))))
}

async fn get_shoe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShoeResponse>> {
    let store = state.store.lock().await;
    let shoe = store.get_shoe(&id).cloned().ok_or_else(|| shoe_not_found(&id))?;
    Ok(Json(ShoeResponse::new(&store, shoe)))
}

async fn update_shoe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<ShoeUpdate>,
) -> Result<Json<ShoeResponse>> {
    let mut store = state.store.lock().await;
    let shoe = store
        .update_shoe(&id, &update)?
        .ok_or_else(|| shoe_not_found(&id))?;
    Ok(Json(ShoeResponse::new(&store, shoe)))
}

async fn delete_shoe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let mut store = state.store.lock().await;
    if store.delete_shoe(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(shoe_not_found(&id))
    }
}

// ─── Retirement ──────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RetireRequest {
    #[serde(default)]
    reason: Option<String>,
}

async fn retire_shoe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<RetireRequest>,
) -> Result<Json<ShoeResponse>> {
    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(MANUAL_RETIRE_REASON);

    let mut store = state.store.lock().await;
    let shoe = store
        .retire_shoe(&id, reason)
        .ok_or_else(|| shoe_not_found(&id))?;
    Ok(Json(ShoeResponse::new(&store, shoe)))
}

async fn unretire_shoe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShoeResponse>> {
    let mut store = state.store.lock().await;
    let shoe = store
        .unretire_shoe(&id)
        .ok_or_else(|| shoe_not_found(&id))?;
    Ok(Json(ShoeResponse::new(&store, shoe)))
}

// ─── Derived ─────────────────────────────────────────────────

async fn get_shoe_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShoeStats>> {
    let store = state.store.lock().await;
    let stats = store
        .get_shoe_stats(&id)
        .ok_or_else(|| shoe_not_found(&id))?;
    Ok(Json(stats.as_ref().clone()))
}

async fn get_shoe_runs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RunSummary>>> {
    let store = state.store.lock().await;
    if store.get_shoe(&id).is_none() {
        return Err(shoe_not_found(&id));
    }
    let unit = store.settings().distance_unit;
    Ok(Json(
        store
            .get_runs_for_shoe(&id)
            .iter()
            .map(|run| RunSummary::from_run(run, unit))
            .collect(),
    ))
}

async fn get_brands(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let store = state.store.lock().await;
    Json(store.get_brands().as_ref().clone())
}

fn shoe_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Shoe {} not found", id))
}
