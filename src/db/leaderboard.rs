// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Season rollups over a fixed set of users.

use super::Db;
use crate::error::AppError;
use crate::models::leaderboard::{LeaderboardMetric, LeaderboardRow};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl Db {
    /// Aggregate `metric` for each of `user_ids` over non-deleted runs that
    /// started at or after `season_start`. Users without runs get zero.
    /// Ordered by value descending, then user id ascending.
    pub async fn leaderboard(
        &self,
        user_ids: &[Uuid],
        metric: LeaderboardMetric,
        season_start: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardRow>, AppError> {
        let sql = format!(
            r#"
            SELECT
                u.id AS user_id,
                u.display_name,
                {aggregate} AS value,
                COUNT(r.id) AS run_count
            FROM users u
            LEFT JOIN runs r
              ON r.user_id = u.id AND r.is_deleted = FALSE AND r.start_time >= $2
            WHERE u.id = ANY($1)
            GROUP BY u.id
            ORDER BY value DESC, u.id ASC
            "#,
            aggregate = metric.aggregate_sql()
        );

        Ok(sqlx::query_as::<_, LeaderboardRow>(&sql)
            .bind(user_ids)
            .bind(season_start)
            .fetch_all(self.pool()?)
            .await?)
    }
}
