// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run upload, sync and retrieval.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::run::{RunFilter, SyncStatusEntry};
use crate::models::{
    BatchItemResult, BatchItemStatus, Run, RunSummary, RunUpload, UpsertOutcome,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

/// Maximum runs accepted in one batch upload.
pub const MAX_BATCH_RUNS: usize = 50;
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One page of run summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPage {
    pub items: Vec<RunSummary>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// Resolve a requested page and limit to `(page, limit, offset)`.
///
/// Pages start at 1; the limit is clamped to `1..=MAX_PAGE_LIMIT`.
pub fn page_window(page: Option<u32>, limit: Option<u32>) -> Result<(u32, u32, i64)> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = i64::from(page - 1)
        .checked_mul(i64::from(limit))
        .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;
    Ok((page, limit, offset))
}

pub struct RunService {
    db: Db,
}

impl RunService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert or overwrite the run identified by its client id.
    pub async fn upsert_run(&self, user_id: Uuid, run: &RunUpload) -> Result<UpsertOutcome> {
        run.validate()?;

        let outcome = self.db.upsert_run(user_id, run).await?.ok_or_else(|| {
            AppError::Conflict("Run was deleted and cannot be re-uploaded".to_string())
        })?;

        tracing::info!(
            user_id = %user_id,
            run_id = %outcome.server_id,
            created = outcome.created,
            "Run upserted"
        );
        Ok(outcome)
    }

    /// Upsert each element independently, in order.
    ///
    /// Only an empty or oversized batch fails as a whole; a bad element is
    /// reported in its own result entry.
    pub async fn upsert_batch(
        &self,
        user_id: Uuid,
        items: Vec<serde_json::Value>,
    ) -> Result<Vec<BatchItemResult>> {
        if items.is_empty() {
            return Err(AppError::Validation("runs must not be empty".to_string()));
        }
        if items.len() > MAX_BATCH_RUNS {
            return Err(AppError::Validation(format!(
                "At most {MAX_BATCH_RUNS} runs per batch"
            )));
        }

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let client_id = client_id_hint(&item);
            let result = match serde_json::from_value::<RunUpload>(item) {
                Ok(run) => match self.upsert_run(user_id, &run).await {
                    Ok(outcome) => BatchItemResult {
                        index,
                        client_id,
                        status: if outcome.created {
                            BatchItemStatus::Created
                        } else {
                            BatchItemStatus::Updated
                        },
                        id: Some(outcome.server_id),
                        message: None,
                    },
                    Err(e) => item_error(index, client_id, batch_error_message(&e)),
                },
                Err(e) => item_error(index, client_id, format!("Invalid run: {e}")),
            };
            results.push(result);
        }

        let failed = results
            .iter()
            .filter(|r| r.status == BatchItemStatus::Error)
            .count();
        tracing::info!(user_id = %user_id, total = results.len(), failed, "Batch upload processed");

        Ok(results)
    }

    pub async fn list_runs(
        &self,
        user_id: Uuid,
        filter: &RunFilter,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<RunPage> {
        let (page, limit, offset) = page_window(page, limit)?;
        let items = self
            .db
            .list_runs(user_id, filter, i64::from(limit), offset)
            .await?;
        let total = self.db.count_runs(user_id, filter).await?;

        Ok(RunPage {
            items,
            total,
            page,
            limit,
        })
    }

    pub async fn get_run(&self, user_id: Uuid, run_id: Uuid) -> Result<Run> {
        self.db
            .get_run(user_id, run_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Run not found".to_string()))
    }

    pub async fn delete_run(&self, user_id: Uuid, run_id: Uuid) -> Result<()> {
        if !self.db.soft_delete_run(user_id, run_id).await? {
            return Err(AppError::NotFound("Run not found".to_string()));
        }
        tracing::info!(user_id = %user_id, run_id = %run_id, "Run deleted");
        Ok(())
    }

    /// Runs changed after `since`, deleted ones included.
    pub async fn sync_status(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<SyncStatusEntry>> {
        self.db.runs_changed_since(user_id, since).await
    }
}

fn client_id_hint(item: &serde_json::Value) -> Option<String> {
    item.get("clientId")
        .or_else(|| item.get("id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn item_error(index: usize, client_id: Option<String>, message: String) -> BatchItemResult {
    BatchItemResult {
        index,
        client_id,
        status: BatchItemStatus::Error,
        id: None,
        message: Some(message),
    }
}

/// Per-item message; storage failures stay generic.
fn batch_error_message(err: &AppError) -> String {
    match err {
        AppError::Database(_) | AppError::Internal(_) => {
            tracing::error!(error = %err, "Batch item failed");
            "Failed to save run".to_string()
        }
        other => other.to_string(),
    }
}
