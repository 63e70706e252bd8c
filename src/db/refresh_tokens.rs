// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh token persistence.
//!
//! Tokens are stored as SHA-256 digests. Issuance, rotation and pruning take
//! a connection so the session manager can run them inside one transaction.

use super::Db;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

/// Persist a newly issued refresh token.
pub async fn insert(
    conn: &mut PgConnection,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(conn)
        .await?;
    Ok(())
}

/// Delete expired tokens and all but the `keep` most recently created ones.
/// Returns the number of rows removed.
pub async fn prune(conn: &mut PgConnection, user_id: Uuid, keep: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM refresh_tokens
        WHERE user_id = $1
          AND (
            expires_at <= now()
            OR id NOT IN (
                SELECT id FROM refresh_tokens
                WHERE user_id = $1
                ORDER BY id DESC
                LIMIT $2
            )
          )
        "#,
    )
    .bind(user_id)
    .bind(keep)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Atomically remove a token, returning its expiry if it existed.
///
/// Concurrent callers presenting the same token serialize on the row lock;
/// only one of them sees it.
pub async fn consume(
    conn: &mut PgConnection,
    user_id: Uuid,
    token_hash: &str,
) -> Result<Option<DateTime<Utc>>, AppError> {
    Ok(sqlx::query_scalar::<_, DateTime<Utc>>(
        "DELETE FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2 RETURNING expires_at",
    )
    .bind(user_id)
    .bind(token_hash)
    .fetch_optional(conn)
    .await?)
}

impl Db {
    /// Revoke a single refresh token.
    pub async fn revoke_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2")
                .bind(user_id)
                .bind(token_hash)
                .execute(self.pool()?)
                .await?;
        Ok(result.rows_affected())
    }

    /// Revoke every refresh token of a user.
    pub async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected())
    }

    /// Digests of a user's live tokens, newest first.
    pub async fn list_refresh_token_hashes(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT token_hash FROM refresh_tokens WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await?)
    }
}
