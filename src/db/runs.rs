// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run persistence keyed on `(user_id, client_id)`.

use super::Db;
use crate::error::AppError;
use crate::models::run::{Run, RunFilter, RunSummary, RunUpload, SyncStatusEntry, UpsertOutcome};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Columns selected for [`RunSummary`].
macro_rules! run_summary_columns {
    () => {
        "id, client_id, name, resort_name, start_time, end_time, distance, max_speed, \
         avg_speed, elevation_drop, duration_secs, points, difficulty, updated_at"
    };
}

/// Shared predicate for listing and counting a user's visible runs.
macro_rules! visible_runs_filter {
    () => {
        "user_id = $1 AND is_deleted = FALSE \
         AND ($2::TEXT IS NULL OR LOWER(resort_name) = LOWER($2::TEXT)) \
         AND ($3::TIMESTAMPTZ IS NULL OR start_time >= $3::TIMESTAMPTZ)"
    };
}

impl Db {
    /// Insert or overwrite a run in one statement.
    ///
    /// Returns `None` when the client id belongs to a soft-deleted run, which
    /// is never overwritten or revived.
    pub async fn upsert_run(
        &self,
        user_id: Uuid,
        run: &RunUpload,
    ) -> Result<Option<UpsertOutcome>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, bool)>(
            r#"
            INSERT INTO runs (
                id, user_id, client_id, name, resort_name, resort_lat, resort_lon,
                start_time, end_time, distance, max_speed, avg_speed, elevation_drop,
                start_elevation, end_elevation, duration_secs, points, calories,
                avg_heart_rate, max_heart_rate, difficulty, route
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22)
            ON CONFLICT (user_id, client_id) DO UPDATE SET
                name = EXCLUDED.name,
                resort_name = EXCLUDED.resort_name,
                resort_lat = EXCLUDED.resort_lat,
                resort_lon = EXCLUDED.resort_lon,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                distance = EXCLUDED.distance,
                max_speed = EXCLUDED.max_speed,
                avg_speed = EXCLUDED.avg_speed,
                elevation_drop = EXCLUDED.elevation_drop,
                start_elevation = EXCLUDED.start_elevation,
                end_elevation = EXCLUDED.end_elevation,
                duration_secs = EXCLUDED.duration_secs,
                points = EXCLUDED.points,
                calories = EXCLUDED.calories,
                avg_heart_rate = EXCLUDED.avg_heart_rate,
                max_heart_rate = EXCLUDED.max_heart_rate,
                difficulty = EXCLUDED.difficulty,
                route = EXCLUDED.route,
                updated_at = now()
            WHERE runs.is_deleted = FALSE
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(run.client_id.trim())
        .bind(&run.name)
        .bind(&run.resort_name)
        .bind(run.resort_lat)
        .bind(run.resort_lon)
        .bind(run.start_time)
        .bind(run.end_time)
        .bind(run.distance)
        .bind(run.max_speed)
        .bind(run.avg_speed)
        .bind(run.elevation_drop)
        .bind(run.start_elevation)
        .bind(run.end_elevation)
        .bind(run.duration_secs)
        .bind(run.points)
        .bind(run.calories)
        .bind(run.avg_heart_rate)
        .bind(run.max_heart_rate)
        .bind(run.difficulty.map(|d| d.as_str()))
        .bind(&run.route)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(row.map(|(server_id, created)| UpsertOutcome { server_id, created }))
    }

    /// Page through a user's visible runs, newest first.
    pub async fn list_runs(
        &self,
        user_id: Uuid,
        filter: &RunFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RunSummary>, AppError> {
        Ok(sqlx::query_as::<_, RunSummary>(concat!(
            "SELECT ",
            run_summary_columns!(),
            " FROM runs WHERE ",
            visible_runs_filter!(),
            " ORDER BY start_time DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(user_id)
        .bind(&filter.resort)
        .bind(filter.since)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool()?)
        .await?)
    }

    /// Count a user's visible runs under the same filter as [`Db::list_runs`].
    pub async fn count_runs(&self, user_id: Uuid, filter: &RunFilter) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>(concat!(
            "SELECT COUNT(*) FROM runs WHERE ",
            visible_runs_filter!()
        ))
        .bind(user_id)
        .bind(&filter.resort)
        .bind(filter.since)
        .fetch_one(self.pool()?)
        .await?)
    }

    /// Get a visible run owned by `user_id`.
    pub async fn get_run(&self, user_id: Uuid, run_id: Uuid) -> Result<Option<Run>, AppError> {
        Ok(sqlx::query_as::<_, Run>(
            "SELECT * FROM runs WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE",
        )
        .bind(run_id)
        .bind(user_id)
        .fetch_optional(self.pool()?)
        .await?)
    }

    /// Get a run by id regardless of its deleted flag (audit access).
    pub async fn get_run_any_state(&self, run_id: Uuid) -> Result<Option<Run>, AppError> {
        Ok(sqlx::query_as::<_, Run>("SELECT * FROM runs WHERE id = $1")
            .bind(run_id)
            .fetch_optional(self.pool()?)
            .await?)
    }

    /// Mark a visible run deleted. Returns false if absent or already deleted.
    pub async fn soft_delete_run(&self, user_id: Uuid, run_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE runs
            SET is_deleted = TRUE, deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE
            "#,
        )
        .bind(run_id)
        .bind(user_id)
        .execute(self.pool()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Runs changed after `since`, including deleted ones, oldest change first.
    pub async fn runs_changed_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<SyncStatusEntry>, AppError> {
        Ok(sqlx::query_as::<_, SyncStatusEntry>(
            r#"
            SELECT id, client_id, updated_at, is_deleted AS deleted
            FROM runs
            WHERE user_id = $1 AND updated_at > $2
            ORDER BY updated_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool()?)
        .await?)
    }
}
