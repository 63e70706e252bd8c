// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend graph: one edge per unordered pair of users.

use super::Db;
use crate::error::AppError;
use crate::models::friendship::{FriendRow, Friendship, FriendshipStatus};
use uuid::Uuid;

impl Db {
    /// Find the edge between two users, in either direction.
    pub async fn find_friendship(&self, a: Uuid, b: Uuid) -> Result<Option<Friendship>, AppError> {
        Ok(sqlx::query_as::<_, Friendship>(
            r#"
            SELECT * FROM friendships
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(self.pool()?)
        .await?)
    }

    /// Number of accepted edges touching `user_id`.
    pub async fn count_accepted_friends(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM friendships
            WHERE (requester_id = $1 OR addressee_id = $1) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool()?)
        .await?)
    }

    /// Insert an edge. The unique pair index rejects a second edge between
    /// the same users with a conflict.
    pub async fn insert_friendship(
        &self,
        requester_id: Uuid,
        addressee_id: Uuid,
        status: FriendshipStatus,
    ) -> Result<Friendship, AppError> {
        Ok(sqlx::query_as::<_, Friendship>(
            r#"
            INSERT INTO friendships (id, requester_id, addressee_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(requester_id)
        .bind(addressee_id)
        .bind(status.as_str())
        .fetch_one(self.pool()?)
        .await?)
    }

    /// Delete the edge between two users unless it is blocked.
    pub async fn delete_friendship(&self, a: Uuid, b: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE ((requester_id = $1 AND addressee_id = $2)
                OR (requester_id = $2 AND addressee_id = $1))
              AND status <> 'blocked'
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(self.pool()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether an accepted edge joins the two users.
    pub async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM friendships
                WHERE ((requester_id = $1 AND addressee_id = $2)
                    OR (requester_id = $2 AND addressee_id = $1))
                  AND status = 'accepted'
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(self.pool()?)
        .await?)
    }

    /// Ids of every accepted counterpart of `user_id`.
    pub async fn accepted_friend_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT CASE WHEN requester_id = $1 THEN addressee_id ELSE requester_id END
            FROM friendships
            WHERE (requester_id = $1 OR addressee_id = $1) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await?)
    }

    /// Accepted friends with live stats over their non-deleted runs.
    pub async fn list_friends(&self, user_id: Uuid) -> Result<Vec<FriendRow>, AppError> {
        Ok(sqlx::query_as::<_, FriendRow>(
            r#"
            SELECT
                u.id AS user_id,
                u.display_name,
                u.home_resort,
                f.id AS friendship_id,
                f.created_at AS friends_since,
                COUNT(r.id) AS run_count,
                COALESCE(SUM(r.points), 0)::BIGINT AS total_points,
                COALESCE(MAX(r.max_speed), 0)::DOUBLE PRECISION AS top_speed,
                COALESCE(SUM(r.elevation_drop), 0)::DOUBLE PRECISION AS total_vertical
            FROM friendships f
            JOIN users u
              ON u.id = CASE WHEN f.requester_id = $1 THEN f.addressee_id ELSE f.requester_id END
            LEFT JOIN runs r
              ON r.user_id = u.id AND r.is_deleted = FALSE
            WHERE (f.requester_id = $1 OR f.addressee_id = $1) AND f.status = 'accepted'
            GROUP BY u.id, f.id
            ORDER BY u.display_name ASC, u.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await?)
    }
}
