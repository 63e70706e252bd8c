// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Season leaderboards over the caller and their friends.

use crate::db::Db;
use crate::error::Result;
use crate::models::leaderboard::LeaderboardRow;
use crate::models::{LeaderboardEntry, LeaderboardMetric};
use crate::time_utils::season_start;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

/// Ranked season standings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub metric: LeaderboardMetric,
    pub season_start: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}

pub struct LeaderboardService {
    db: Db,
}

impl LeaderboardService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn leaderboard(
        &self,
        user_id: Uuid,
        metric: LeaderboardMetric,
    ) -> Result<Leaderboard> {
        let mut visible = self.db.accepted_friend_ids(user_id).await?;
        visible.push(user_id);

        let since = season_start(Utc::now());
        let rows = self.db.leaderboard(&visible, metric, since).await?;

        tracing::debug!(
            user_id = %user_id,
            metric = ?metric,
            users = rows.len(),
            "Leaderboard computed"
        );
        Ok(Leaderboard {
            metric,
            season_start: since,
            entries: rank_entries(rows, user_id),
        })
    }
}

/// Order rows by value descending then user id ascending, and number them
/// from 1.
pub fn rank_entries(mut rows: Vec<LeaderboardRow>, me: Uuid) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| match b.value.total_cmp(&a.value) {
        Ordering::Equal => a.user_id.cmp(&b.user_id),
        other => other,
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i as u32 + 1,
            is_you: row.user_id == me,
            user_id: row.user_id,
            display_name: row.display_name,
            value: row.value,
            run_count: row.run_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u128, value: f64) -> LeaderboardRow {
        LeaderboardRow {
            user_id: Uuid::from_u128(id),
            display_name: format!("user{id}"),
            value,
            run_count: 1,
        }
    }

    #[test]
    fn test_rank_orders_by_value_then_id() {
        let me = Uuid::from_u128(2);
        let ranked = rank_entries(vec![row(3, 10.0), row(2, 40.0), row(1, 10.0)], me);

        let ids: Vec<u128> = ranked.iter().map(|e| e.user_id.as_u128()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
        assert!(ranked[0].is_you);
        assert!(!ranked[1].is_you);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_entries(Vec::new(), Uuid::nil()).is_empty());
    }
}
