// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Season leaderboard model.

use serde::Serialize;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Metric a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardMetric {
    /// Total points
    Season,
    /// Top speed of any single run
    Speed,
    /// Total vertical drop
    Vert,
    /// Total distance
    Distance,
}

impl LeaderboardMetric {
    /// SQL aggregate over the `r` alias of the runs table.
    pub(crate) fn aggregate_sql(&self) -> &'static str {
        match self {
            LeaderboardMetric::Season => "COALESCE(SUM(r.points), 0)::DOUBLE PRECISION",
            LeaderboardMetric::Speed => "COALESCE(MAX(r.max_speed), 0)::DOUBLE PRECISION",
            LeaderboardMetric::Vert => "COALESCE(SUM(r.elevation_drop), 0)::DOUBLE PRECISION",
            LeaderboardMetric::Distance => "COALESCE(SUM(r.distance), 0)::DOUBLE PRECISION",
        }
    }
}

impl FromStr for LeaderboardMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "season" => Ok(LeaderboardMetric::Season),
            "speed" => Ok(LeaderboardMetric::Speed),
            "vert" => Ok(LeaderboardMetric::Vert),
            "distance" => Ok(LeaderboardMetric::Distance),
            other => Err(format!("Unknown leaderboard: {other}")),
        }
    }
}

/// Aggregated value for one user.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub display_name: String,
    pub value: f64,
    pub run_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub display_name: String,
    pub value: f64,
    pub run_count: i64,
    pub is_you: bool,
}
