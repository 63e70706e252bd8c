// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation tests for the public auth routes.
//!
//! Validation runs before any storage access, so these run offline.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app};

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn assert_bad_request(uri: &str, body: String) -> serde_json::Value {
    let (app, _) = create_test_app();
    let response = app.oneshot(post_json(uri, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");

    let body = body_json(response).await;
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    body
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let body = json!({"email": "not-an-email", "password": "password123"});
    let response = assert_bad_request("/v1/auth/register", body.to_string()).await;
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("A valid email is required"));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let body = json!({"email": "alice@example.com", "password": "short"});
    assert_bad_request("/v1/auth/register", body.to_string()).await;
}

#[tokio::test]
async fn test_register_rejects_overlong_display_name() {
    let body = json!({
        "email": "alice@example.com",
        "password": "password123",
        "displayName": "x".repeat(51)
    });
    assert_bad_request("/v1/auth/register", body.to_string()).await;
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let body = json!({"email": "alice@example.com", "password": ""});
    assert_bad_request("/v1/auth/login", body.to_string()).await;

    let body = json!({"email": "alice@example.com"});
    assert_bad_request("/v1/auth/login", body.to_string()).await;
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    assert_bad_request("/v1/auth/login", "{not json".to_string()).await;
}

#[tokio::test]
async fn test_apple_requires_identity_token() {
    let body = json!({"identityToken": ""});
    assert_bad_request("/v1/auth/apple", body.to_string()).await;
}

#[tokio::test]
async fn test_refresh_with_garbage_token_is_unauthorized() {
    let (app, _) = create_test_app();
    let body = json!({"refreshToken": "garbage"});

    let response = app
        .oneshot(post_json("/v1/auth/refresh", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_access_token_is_unauthorized() {
    use ski_tracker::models::User;

    let (app, state) = create_test_app();
    let now = chrono::Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4(),
        email: Some("alice@example.com".to_string()),
        password_hash: None,
        apple_user_id: None,
        display_name: "alice".to_string(),
        home_resort: None,
        units: "metric".to_string(),
        weight_kg: None,
        haptics_enabled: true,
        battery_saver: false,
        invite_code: "SKI-ELK-1234".to_string(),
        is_banned: false,
        created_at: now,
        updated_at: now,
        last_login_at: None,
    };
    let access = state.sessions.sign_access_token(&user).unwrap();

    let body = json!({ "refreshToken": access });
    let response = app
        .oneshot(post_json("/v1/auth/refresh", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
