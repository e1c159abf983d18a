// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use stridesync::clock::ManualClock;
use stridesync::config::Config;
use stridesync::db::KvStore;
use stridesync::models::{LocationSample, NewShoe, Run};
use stridesync::routes::create_router;
use stridesync::services::{ChannelLocationProvider, PermissionStatus};
use stridesync::AppState;
use tower::ServiceExt;

/// Fixed "now" for every test app.
#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A test app and the handles tests use to drive it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub clock: ManualClock,
}

/// Create a test app backed by an in-memory store.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    create_test_app_with(KvStore::in_memory(), PermissionStatus::Granted).await
}

/// Create a test app over `kv` with the given location permission.
#[allow(dead_code)]
pub async fn create_test_app_with(kv: KvStore, permission: PermissionStatus) -> TestApp {
    let clock = ManualClock::new(t0());
    let config = Config {
        storage_namespace: "@test".to_string(),
        ..Config::default()
    };
    let state = Arc::new(
        AppState::build(
            config,
            kv,
            Arc::new(clock.clone()),
            ChannelLocationProvider::new(permission),
        )
        .await,
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        clock,
    }
}

/// Send a request and return the status and the parsed JSON body
/// (`Value::Null` for an empty body).
#[allow(dead_code)]
pub async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[allow(dead_code)]
pub fn new_shoe(name: &str, brand: &str, max_distance: f64) -> NewShoe {
    NewShoe {
        name: name.to_string(),
        brand: brand.to_string(),
        model: "Model".to_string(),
        purchase_date: None,
        max_distance,
        notes: None,
    }
}

/// A finished run `days_ago` days before [`t0`], 5:30 /km, two-point path.
#[allow(dead_code)]
pub fn make_run(shoe_id: Option<&str>, days_ago: i64, distance: f64) -> Run {
    let start = t0() - Duration::days(days_ago);
    let mut run = Run::new_draft(start, shoe_id.map(String::from));
    run.distance = distance;
    run.duration = (distance * 330.0).round() as u64;
    run.end_time = Some(start + Duration::seconds(run.duration as i64));
    run.path = vec![
        sample(37.3300, -122.0300, start),
        sample(37.3390, -122.0300, start + Duration::seconds(300)),
    ];
    run.refresh_pace();
    run
}

#[allow(dead_code)]
pub fn sample(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> LocationSample {
    LocationSample {
        latitude,
        longitude,
        timestamp,
        altitude: None,
        accuracy: Some(5.0),
        speed: None,
    }
}
