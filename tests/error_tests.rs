// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use stridesync::error::AppError;
use stridesync::services::SessionError;

async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_not_found_and_bad_request_carry_details() {
    let (status, body) = body_json(AppError::NotFound("Shoe x not found".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "Shoe x not found");

    let (status, body) = body_json(AppError::BadRequest("bad".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let err: AppError = SessionError::InvalidTransition {
        from: "completed",
        action: "pause",
    }
    .into();
    let (status, body) = body_json(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"], "Cannot pause while completed");
}

#[tokio::test]
async fn test_internal_hides_details() {
    let (status, body) = body_json(anyhow::anyhow!("boom").into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}
