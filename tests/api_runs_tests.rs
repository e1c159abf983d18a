// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run list, run maintenance and statistics endpoints.

use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_list_runs_newest_first_with_display_strings() {
    let app = common::create_test_app().await;
    {
        let mut store = app.state.store.lock().await;
        store.save_run(common::make_run(None, 3, 5.0)).unwrap();
        store.save_run(common::make_run(None, 1, 10.0)).unwrap();
    }

    let (status, body) = common::send(&app, "GET", "/api/runs", None).await;
    assert_eq!(status, StatusCode::OK);

    let runs = body.as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["distance"], 10.0);
    assert_eq!(runs[0]["distance_display"], "10.00 km");
    assert_eq!(runs[0]["pace_display"], "5:30 /km");
    assert_eq!(runs[0]["duration_display"], "00:55:00");
    assert!(runs[0]["polyline"].as_str().is_some_and(|p| !p.is_empty()));
}

#[tokio::test]
async fn test_list_runs_in_miles() {
    let app = common::create_test_app().await;
    app.state
        .store
        .lock()
        .await
        .save_run(common::make_run(None, 1, 16.09344))
        .unwrap();

    let (status, _) = common::send(
        &app,
        "PUT",
        "/api/settings",
        Some(json!({"distance_unit": "mi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::send(&app, "GET", "/api/runs", None).await;
    assert_eq!(body[0]["distance_display"], "10.00 mi");
}

#[tokio::test]
async fn test_get_update_delete_run() {
    let app = common::create_test_app().await;
    let run = app
        .state
        .store
        .lock()
        .await
        .save_run(common::make_run(None, 1, 5.0))
        .unwrap();
    let uri = format!("/api/runs/{}", run.id);

    let (status, body) = common::send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"].as_array().unwrap().len(), 2);

    let (status, body) = common::send(
        &app,
        "PATCH",
        &uri,
        Some(json!({"name": "Easy loop", "effort": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Easy loop");
    assert_eq!(body["effort"], 4);

    let (status, body) = common::send(&app, "PATCH", &uri, Some(json!({"effort": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = common::send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = common::send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_run_route_is_geojson_feature() {
    let app = common::create_test_app().await;
    let run = app
        .state
        .store
        .lock()
        .await
        .save_run(common::make_run(None, 1, 1.0))
        .unwrap();

    let (status, body) =
        common::send(&app, "GET", &format!("/api/runs/{}/route", run.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "LineString");
    assert_eq!(body["geometry"]["coordinates"][0][0], -122.03);
    assert_eq!(body["properties"]["run_id"], run.id.as_str());
}

#[tokio::test]
async fn test_week_stats_without_runs_are_zero() {
    let app = common::create_test_app().await;

    let (status, body) = common::send(&app, "GET", "/api/stats/runs?period=week", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_runs"], 0);
    assert_eq!(body["total_distance"], 0.0);
    assert_eq!(body["total_duration"], 0);
    assert!(body["avg_pace"].is_null());
}

#[tokio::test]
async fn test_week_stats_filter_old_runs() {
    let app = common::create_test_app().await;
    {
        let mut store = app.state.store.lock().await;
        store.save_run(common::make_run(None, 2, 10.0)).unwrap();
        store.save_run(common::make_run(None, 30, 21.1)).unwrap();
    }

    let (_, week) = common::send(&app, "GET", "/api/stats/runs?period=week", None).await;
    assert_eq!(week["total_runs"], 1);
    assert_eq!(week["avg_pace"], json!({"minutes": 5, "seconds": 30}));

    let (_, all) = common::send(&app, "GET", "/api/stats/runs", None).await;
    assert_eq!(all["total_runs"], 2);
}

#[tokio::test]
async fn test_usage_trends_six_months_oldest_first() {
    let app = common::create_test_app().await;
    {
        let mut store = app.state.store.lock().await;
        let shoe = store.add_shoe(common::new_shoe("Daily", "Asics", 0.0)).unwrap();
        store
            .save_run(common::make_run(Some(&shoe.id), 1, 8.0))
            .unwrap();
        // Runs without a shoe are left out of the buckets
        store.save_run(common::make_run(None, 1, 5.0)).unwrap();
    }

    let (status, body) = common::send(&app, "GET", "/api/stats/trends?periods=6", None).await;
    assert_eq!(status, StatusCode::OK);

    let buckets = body.as_array().unwrap();
    assert_eq!(buckets.len(), 6);
    assert_eq!(buckets[0]["period"], "2024-01");
    assert_eq!(buckets[5]["period"], "2024-06");
    assert_eq!(buckets[5]["run_count"], 1);
    assert_eq!(buckets[5]["total_distance"], 8.0);
    assert_eq!(buckets[5]["shoes"][0]["shoe_name"], "Daily");
    assert_eq!(buckets[5]["shoes"][0]["percentage"], 100.0);
    assert!(buckets[0]["shoes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_usage_trends_rejects_zero_periods() {
    let app = common::create_test_app().await;
    let (status, _) = common::send(&app, "GET", "/api/stats/trends?periods=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
