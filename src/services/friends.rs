// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend graph operations.
//!
//! Redeeming an invite code creates an accepted edge immediately; there is
//! no approval step.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::run::RunFilter;
use crate::models::{FriendEntry, Friendship, FriendshipStatus};
use crate::services::invite_codes::{is_well_formed, normalize_invite_code};
use crate::services::runs::{page_window, RunPage};
use uuid::Uuid;

/// Accepted friendships a user may hold.
pub const MAX_FRIENDS: i64 = 50;

pub struct FriendService {
    db: Db,
}

impl FriendService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Befriend the owner of `code`.
    pub async fn add_by_invite_code(&self, user_id: Uuid, code: &str) -> Result<Friendship> {
        let code = normalize_invite_code(code);
        if !is_well_formed(&code) {
            return Err(AppError::NotFound("Invite code not found".to_string()));
        }

        let target = self
            .db
            .get_user_by_invite_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite code not found".to_string()))?;

        if target.id == user_id {
            return Err(AppError::Validation("You cannot add yourself".to_string()));
        }

        if self.db.count_accepted_friends(user_id).await? >= MAX_FRIENDS {
            return Err(AppError::LimitExceeded(format!(
                "Friend limit of {MAX_FRIENDS} reached"
            )));
        }

        if let Some(existing) = self.db.find_friendship(user_id, target.id).await? {
            return Err(AppError::Conflict(
                existing.status.conflict_message().to_string(),
            ));
        }

        let friendship = self
            .db
            .insert_friendship(user_id, target.id, FriendshipStatus::Accepted)
            .await
            .map_err(|e| match e {
                // Concurrent redemption from the other side won the pair index.
                AppError::Conflict(_) => {
                    AppError::Conflict(FriendshipStatus::Accepted.conflict_message().to_string())
                }
                other => other,
            })?;

        tracing::info!(user_id = %user_id, friend_id = %target.id, "Friendship created");
        Ok(friendship)
    }

    /// Remove the edge with `other_id` in either direction.
    pub async fn remove(&self, user_id: Uuid, other_id: Uuid) -> Result<()> {
        if !self.db.delete_friendship(user_id, other_id).await? {
            return Err(AppError::NotFound("Friendship not found".to_string()));
        }
        tracing::info!(user_id = %user_id, friend_id = %other_id, "Friendship removed");
        Ok(())
    }

    pub async fn list_friends(&self, user_id: Uuid) -> Result<Vec<FriendEntry>> {
        let rows = self.db.list_friends(user_id).await?;
        Ok(rows.into_iter().map(FriendEntry::from).collect())
    }

    /// A friend's runs, summaries only. Requires an accepted edge.
    pub async fn list_friend_runs(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<RunPage> {
        if !self.db.are_friends(user_id, friend_id).await? {
            return Err(AppError::Forbidden(
                "You can only view runs of your friends".to_string(),
            ));
        }

        let (page, limit, offset) = page_window(page, limit)?;
        let filter = RunFilter::default();
        let items = self
            .db
            .list_runs(friend_id, &filter, i64::from(limit), offset)
            .await?;
        let total = self.db.count_runs(friend_id, &filter).await?;

        Ok(RunPage {
            items,
            total,
            page,
            limit,
        })
    }
}
