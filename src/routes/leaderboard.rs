// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Season leaderboard routes.

use super::extract::ApiPath;
use super::{ok, ApiResponse};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::LeaderboardMetric;
use crate::services::Leaderboard;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/v1/leaderboard/{metric}", get(leaderboard))
}

/// `metric` is one of `season`, `speed`, `vert` or `distance`.
async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(metric): ApiPath<String>,
) -> Result<Json<ApiResponse<Leaderboard>>> {
    let metric: LeaderboardMetric = metric.parse().map_err(AppError::NotFound)?;
    Ok(ok(state.leaderboard.leaderboard(user.user_id, metric).await?))
}
