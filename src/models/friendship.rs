// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend graph model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Status of an edge between two users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Blocked => "blocked",
        }
    }

    /// Message returned when a new edge collides with an existing one.
    pub fn conflict_message(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "Friend request pending",
            FriendshipStatus::Accepted => "Already friends",
            FriendshipStatus::Blocked => "Unable to add this user",
        }
    }
}

impl TryFrom<String> for FriendshipStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            "blocked" => Ok(FriendshipStatus::Blocked),
            other => Err(format!("unknown friendship status: {other}")),
        }
    }
}

/// Edge stored in the `friendships` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    /// The party on the other end of the edge from `user_id`.
    pub fn other_party(&self, user_id: Uuid) -> Uuid {
        if self.requester_id == user_id {
            self.addressee_id
        } else {
            self.requester_id
        }
    }
}

/// Flat row produced by the friend list query.
#[derive(Debug, Clone, FromRow)]
pub struct FriendRow {
    pub user_id: Uuid,
    pub display_name: String,
    pub home_resort: Option<String>,
    pub friendship_id: Uuid,
    pub friends_since: DateTime<Utc>,
    pub run_count: i64,
    pub total_points: i64,
    pub top_speed: f64,
    pub total_vertical: f64,
}

/// Public view of a friend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendUser {
    pub id: Uuid,
    pub display_name: String,
    pub home_resort: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipMeta {
    pub id: Uuid,
    pub since: DateTime<Utc>,
}

/// Live aggregate over a friend's non-deleted runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendStats {
    pub run_count: i64,
    pub total_points: i64,
    pub top_speed: f64,
    pub total_vertical: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub user: FriendUser,
    pub friendship: FriendshipMeta,
    pub stats: FriendStats,
}

impl From<FriendRow> for FriendEntry {
    fn from(row: FriendRow) -> Self {
        Self {
            user: FriendUser {
                id: row.user_id,
                display_name: row.display_name,
                home_resort: row.home_resort,
            },
            friendship: FriendshipMeta {
                id: row.friendship_id,
                since: row.friends_since,
            },
            stats: FriendStats {
                run_count: row.run_count,
                total_points: row.total_points,
                top_speed: row.top_speed,
                total_vertical: row.total_vertical,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            FriendshipStatus::try_from("accepted".to_string()),
            Ok(FriendshipStatus::Accepted)
        );
        assert!(FriendshipStatus::try_from("rejected".to_string()).is_err());
    }

    #[test]
    fn test_other_party() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let edge = Friendship {
            id: Uuid::new_v4(),
            requester_id: a,
            addressee_id: b,
            status: FriendshipStatus::Accepted,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(edge.other_party(a), b);
        assert_eq!(edge.other_party(b), a);
    }
}
