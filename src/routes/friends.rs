// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend list, invite redemption and friend run routes.

use super::extract::{ApiPath, ApiQuery};
use super::{created, message, ok, ApiResponse, MessageData};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{FriendEntry, Friendship};
use crate::services::RunPage;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/friends", get(list_friends))
        .route("/v1/friends/invite/{code}", post(redeem_invite))
        .route("/v1/friends/{id}", delete(remove_friend))
        .route("/v1/friends/{id}/runs", get(friend_runs))
}

async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<FriendEntry>>>> {
    Ok(ok(state.friends.list_friends(user.user_id).await?))
}

/// Befriend the owner of an invite code. Accepted immediately.
async fn redeem_invite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(code): ApiPath<String>,
) -> Result<(StatusCode, Json<ApiResponse<Friendship>>)> {
    let friendship = state.friends.add_by_invite_code(user.user_id, &code).await?;
    Ok(created(friendship))
}

async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(friend_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>> {
    state.friends.remove(user.user_id, friend_id).await?;
    Ok(message("Friend removed"))
}

#[derive(Debug, Deserialize)]
struct FriendRunsQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn friend_runs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(friend_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<FriendRunsQuery>,
) -> Result<Json<ApiResponse<RunPage>>> {
    let page = state
        .friends
        .list_friend_runs(user.user_id, friend_id, params.page, params.limit)
        .await?;
    Ok(ok(page))
}
