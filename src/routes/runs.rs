// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run upload, sync and retrieval routes.

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::{message, ok, ApiResponse, MessageData};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::run::{RunFilter, SyncStatusEntry};
use crate::models::{BatchItemResult, BatchItemStatus, Run, RunUpload};
use crate::services::RunPage;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/runs", post(upload_run).get(list_runs))
        .route("/v1/runs/bulk", post(upload_batch))
        .route("/v1/runs/sync/status", get(sync_status))
        .route("/v1/runs/{id}", get(get_run).delete(delete_run))
}

// ─── Upload ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    pub id: Uuid,
    pub client_id: String,
    pub created: bool,
}

/// Create or overwrite one run. 201 when created, 200 when updated.
async fn upload_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(run): ApiJson<RunUpload>,
) -> Result<(StatusCode, Json<ApiResponse<UpsertResponse>>)> {
    let outcome = state.runs.upsert_run(user.user_id, &run).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        ok(UpsertResponse {
            id: outcome.server_id,
            client_id: run.client_id.trim().to_string(),
            created: outcome.created,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct BatchUploadRequest {
    runs: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadResponse {
    pub results: Vec<BatchItemResult>,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

impl BatchUploadResponse {
    fn from_results(results: Vec<BatchItemResult>) -> Self {
        let count = |status: BatchItemStatus| results.iter().filter(|r| r.status == status).count();
        let created = count(BatchItemStatus::Created);
        let updated = count(BatchItemStatus::Updated);
        let failed = count(BatchItemStatus::Error);
        Self {
            results,
            created,
            updated,
            failed,
        }
    }
}

/// Upsert up to 50 runs; always 200 with one result per input element.
async fn upload_batch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<BatchUploadRequest>,
) -> Result<Json<ApiResponse<BatchUploadResponse>>> {
    let results = state.runs.upsert_batch(user.user_id, req.runs).await?;
    Ok(ok(BatchUploadResponse::from_results(results)))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListRunsQuery {
    page: Option<u32>,
    limit: Option<u32>,
    /// Filter by resort name (case-insensitive)
    resort: Option<String>,
    /// Only runs starting at or after this time (RFC3339)
    since: Option<String>,
}

fn parse_since(since: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    since
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    AppError::Validation(
                        "Invalid 'since' parameter: must be RFC3339 datetime".to_string(),
                    )
                })
        })
        .transpose()
}

async fn list_runs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<ListRunsQuery>,
) -> Result<Json<ApiResponse<RunPage>>> {
    tracing::debug!(
        user_id = %user.user_id,
        resort = ?params.resort,
        since = ?params.since,
        page = ?params.page,
        "Listing runs"
    );

    let filter = RunFilter {
        resort: params
            .resort
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        since: parse_since(params.since.as_deref())?,
    };

    let page = state
        .runs
        .list_runs(user.user_id, &filter, params.page, params.limit)
        .await?;
    Ok(ok(page))
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(run_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Run>>> {
    Ok(ok(state.runs.get_run(user.user_id, run_id).await?))
}

async fn delete_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(run_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>> {
    state.runs.delete_run(user.user_id, run_id).await?;
    Ok(message("Run deleted"))
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SyncStatusQuery {
    since: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub runs: Vec<SyncStatusEntry>,
    /// Pass back as `since` on the next poll
    pub server_time: String,
}

/// Runs changed after `since` (all runs when omitted), deletions included.
async fn sync_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(params): ApiQuery<SyncStatusQuery>,
) -> Result<Json<ApiResponse<SyncStatusResponse>>> {
    let server_time = Utc::now();
    let since = parse_since(params.since.as_deref())?.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let runs = state.runs.sync_status(user.user_id, since).await?;
    Ok(ok(SyncStatusResponse {
        runs,
        server_time: format_utc_rfc3339(server_time),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_since() {
        assert_eq!(parse_since(None).unwrap(), None);
        let parsed = parse_since(Some("2026-01-10T09:00:00+01:00")).unwrap().unwrap();
        assert_eq!(format_utc_rfc3339(parsed), "2026-01-10T08:00:00Z");
        assert!(matches!(
            parse_since(Some("yesterday")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_batch_response_counts() {
        let item = |index, status| BatchItemResult {
            index,
            client_id: None,
            status,
            id: None,
            message: None,
        };
        let response = BatchUploadResponse::from_results(vec![
            item(0, BatchItemStatus::Created),
            item(1, BatchItemStatus::Error),
            item(2, BatchItemStatus::Created),
            item(3, BatchItemStatus::Updated),
        ]);
        assert_eq!(response.created, 2);
        assert_eq!(response.updated, 1);
        assert_eq!(response.failed, 1);
    }
}
