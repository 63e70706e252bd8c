// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use ski_tracker::error::{hide_internal_details, AppError};

mod common;
use common::body_json;

#[tokio::test]
async fn test_client_errors_keep_their_message() {
    let cases = [
        (AppError::Validation("distance: bad".into()), StatusCode::BAD_REQUEST),
        (AppError::LimitExceeded("Friend limit of 50 reached".into()), StatusCode::BAD_REQUEST),
        (AppError::InvalidCredential("Invalid email or password".into()), StatusCode::UNAUTHORIZED),
        (AppError::Forbidden("Account has been suspended".into()), StatusCode::FORBIDDEN),
        (AppError::NotFound("Run not found".into()), StatusCode::NOT_FOUND),
        (AppError::Conflict("Already friends".into()), StatusCode::CONFLICT),
    ];

    for (err, status) in cases {
        let expected = err.to_string();
        let response = err.into_response();
        assert_eq!(response.status(), status);

        let body = body_json(response).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["message"], expected);
    }
}

#[tokio::test]
async fn test_unauthenticated_message() {
    let response = AppError::Unauthenticated.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Authentication required");
}

#[tokio::test]
async fn test_server_error_detail_hidden_in_production() {
    hide_internal_details(true);
    let response = AppError::Database("relation \"runs\" does not exist".into()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "Internal server error");

    hide_internal_details(false);
    let response = AppError::Database("relation \"runs\" does not exist".into()).into_response();
    let message = body_json(response).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("relation"), "{message}");
}
