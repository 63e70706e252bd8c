// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, token refresh, logout and account deletion routes.

use super::extract::ValidatedJson;
use super::{message, ok, ApiResponse, MessageData};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{SessionResult, TokenPair};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    routing::{delete, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Public sign-in routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/auth/apple", post(sign_in_with_apple))
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/refresh", post(refresh))
}

/// Routes that act on the current session (auth required).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/account", delete(delete_account))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct AppleSignInRequest {
    #[validate(length(min = 1, message = "identityToken is required"))]
    identity_token: String,
    #[validate(length(max = 100))]
    full_name: Option<String>,
}

async fn sign_in_with_apple(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AppleSignInRequest>,
) -> Result<Json<ApiResponse<SessionResult>>> {
    let session = state
        .accounts
        .sign_in_with_apple(&req.identity_token, req.full_name.as_deref())
        .await?;
    Ok(ok(session))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    password: String,
    #[validate(length(min = 1, max = 50))]
    display_name: Option<String>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<SessionResult>>)> {
    let session = state
        .accounts
        .register(&req.email, &req.password, req.display_name.as_deref())
        .await?;
    Ok(super::created(session))
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResult>>> {
    let session = state.accounts.login(&req.email, &req.password).await?;
    Ok(ok(session))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[validate(length(min = 1, message = "refreshToken is required"))]
    refresh_token: String,
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>> {
    let tokens = state.sessions.refresh(&req.refresh_token).await?;
    Ok(ok(tokens))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest {
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutResponse {
    revoked: u64,
}

/// Revoke the given refresh token, or every session when the body names none.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<ApiResponse<LogoutResponse>>> {
    let req = parse_logout_body(&body)?;
    let token = req.refresh_token.as_deref().filter(|t| !t.is_empty());

    let revoked = state.sessions.logout(user.user_id, token).await?;
    Ok(ok(LogoutResponse { revoked }))
}

fn parse_logout_body(body: &[u8]) -> Result<LogoutRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LogoutRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid logout body: {e}")))
}

/// Permanently delete the account with its runs, friendships and sessions.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<MessageData>>> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");
    state.accounts.delete_account(user.user_id).await?;
    Ok(message("Account deleted"))
}
