// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for the authenticated user.

use super::extract::ValidatedJson;
use super::{ok, ApiResponse};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::user::ProfileUpdate;
use crate::models::UserProfile;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/v1/profile", get(get_profile).put(update_profile))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    Ok(ok(state.accounts.profile(user.user_id).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(update): ValidatedJson<ProfileUpdate>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile = state.accounts.update_profile(user.user_id, &update).await?;
    tracing::info!(user_id = %user.user_id, "Profile updated");
    Ok(ok(profile))
}
