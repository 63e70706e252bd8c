// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity store: user records and their alternate unique keys.

use super::Db;
use crate::error::AppError;
use crate::models::user::{NewUser, ProfileUpdate, User};
use uuid::Uuid;

/// Alternate unique keys of the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKey {
    Email,
    AppleId,
    InviteCode,
}

impl UserKey {
    fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_email_key" => Some(UserKey::Email),
            "users_apple_user_id_key" => Some(UserKey::AppleId),
            "users_invite_code_key" => Some(UserKey::InviteCode),
            _ => None,
        }
    }
}

/// Outcome of [`Db::insert_user`].
#[derive(Debug)]
pub enum InsertUser {
    Created(User),
    /// Another row already holds this key.
    Taken(UserKey),
}

impl Db {
    /// Get a user by internal id.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool()?)
            .await?)
    }

    /// Get a user by case-folded email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool()?)
                .await?,
        )
    }

    /// Get a user by Apple subject id.
    pub async fn get_user_by_apple_id(&self, apple_user_id: &str) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE apple_user_id = $1")
                .bind(apple_user_id)
                .fetch_optional(self.pool()?)
                .await?,
        )
    }

    /// Get a user by invite code.
    pub async fn get_user_by_invite_code(&self, code: &str) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE invite_code = $1")
                .bind(code)
                .fetch_optional(self.pool()?)
                .await?,
        )
    }

    pub async fn invite_code_exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE invite_code = $1)")
                .bind(code)
                .fetch_one(self.pool()?)
                .await?,
        )
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(self.pool()?)
                .await?,
        )
    }

    /// Insert a user, generating its id. Also stamps `last_login_at`, since
    /// users are only created by a successful sign-in.
    ///
    /// A clash on one of the alternate unique keys is reported as
    /// [`InsertUser::Taken`] so callers can pick another value and retry.
    pub async fn insert_user(&self, new_user: &NewUser) -> Result<InsertUser, AppError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, apple_user_id, display_name, invite_code, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.apple_user_id)
        .bind(&new_user.display_name)
        .bind(&new_user.invite_code)
        .fetch_one(self.pool()?)
        .await;

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User created");
                Ok(InsertUser::Created(user))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let key = db_err.constraint().and_then(UserKey::from_constraint);
                match key {
                    Some(key) => Ok(InsertUser::Taken(key)),
                    None => Err(sqlx::Error::Database(db_err).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stamp a successful login.
    pub async fn touch_last_login(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(self.pool()?)
            .await?;
        Ok(())
    }

    /// Apply a partial profile update and return the updated record.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                home_resort = CASE
                    WHEN $3::TEXT IS NULL THEN home_resort
                    WHEN $3::TEXT = '' THEN NULL
                    ELSE $3::TEXT
                END,
                units = COALESCE($4, units),
                weight_kg = COALESCE($5, weight_kg),
                haptics_enabled = COALESCE($6, haptics_enabled),
                battery_saver = COALESCE($7, battery_saver),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(update.display_name.as_deref().map(str::trim))
        .bind(update.home_resort.as_deref().map(str::trim))
        .bind(update.units.map(|u| u.as_str()))
        .bind(update.weight_kg)
        .bind(update.haptics_enabled)
        .bind(update.battery_saver)
        .fetch_optional(self.pool()?)
        .await?)
    }

    /// Set or clear the banned flag (moderation). A ban also revokes every
    /// refresh token so no session outlives it.
    pub async fn set_user_banned(&self, user_id: Uuid, banned: bool) -> Result<bool, AppError> {
        let mut tx = self.begin().await?;

        let result =
            sqlx::query("UPDATE users SET is_banned = $2, updated_at = now() WHERE id = $1")
                .bind(user_id)
                .bind(banned)
                .execute(&mut *tx)
                .await?;

        if banned {
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::warn!(user_id = %user_id, banned, "User ban flag changed");
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a user; runs, tokens and friendships cascade.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
