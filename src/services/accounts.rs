// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, sign-in and profile management.

use crate::db::users::{InsertUser, UserKey};
use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::user::{derive_display_name, normalize_email, NewUser, ProfileUpdate};
use crate::models::{SessionResult, User, UserProfile};
use crate::services::apple::{AppleIdentityVerifier, AppleTokenError};
use crate::services::invite_codes::{self, MAX_INVITE_CODE_ATTEMPTS};
use crate::services::session::SessionManager;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;
use validator::Validate;

/// bcrypt work factor for stored password hashes.
pub const BCRYPT_COST: u32 = 12;

const INVALID_LOGIN: &str = "Invalid email or password";
const ACCOUNT_SUSPENDED: &str = "Account has been suspended";

/// Hash checked on login failures that have no real hash to check, so every
/// failure costs one bcrypt verification. Only dereferenced on the blocking
/// pool.
static TIMING_EQUALIZER_HASH: LazyLock<String> =
    LazyLock::new(|| bcrypt::hash("timing-equalizer", BCRYPT_COST).unwrap_or_default());

pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check task failed: {}", e)))
}

/// Burn one bcrypt verification against [`TIMING_EQUALIZER_HASH`].
async fn equalize_timing(password: &str) -> Result<()> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let _ = bcrypt::verify(password, TIMING_EQUALIZER_HASH.as_str());
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check task failed: {}", e)))
}

/// Insert `new_user` under a fresh invite code from `next_code`, drawing a
/// new code whenever a concurrent insert claimed the previous one.
///
/// Clashes on other unique keys are returned to the caller.
pub async fn insert_with_invite_code<F, Fut>(
    db: &Db,
    mut new_user: NewUser,
    mut next_code: F,
) -> Result<InsertUser>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
        new_user.invite_code = next_code().await?;
        match db.insert_user(&new_user).await? {
            InsertUser::Taken(UserKey::InviteCode) => {
                tracing::debug!(attempt, "Invite code claimed concurrently, redrawing");
            }
            outcome => return Ok(outcome),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "No free invite code after {MAX_INVITE_CODE_ATTEMPTS} insert attempts"
    )))
}

pub struct AccountService {
    db: Db,
    sessions: Arc<SessionManager>,
    apple: Arc<AppleIdentityVerifier>,
}

impl AccountService {
    pub fn new(db: Db, sessions: Arc<SessionManager>, apple: Arc<AppleIdentityVerifier>) -> Self {
        Self {
            db,
            sessions,
            apple,
        }
    }

    /// Sign in with an Apple identity token, creating the account on first use.
    pub async fn sign_in_with_apple(
        &self,
        identity_token: &str,
        full_name: Option<&str>,
    ) -> Result<SessionResult> {
        let identity = self.apple.verify(identity_token).await.map_err(|e| match e {
            AppleTokenError::Invalid(reason) => {
                tracing::info!(reason = %reason, "Rejected Apple identity token");
                AppError::InvalidCredential("Invalid Apple identity token".to_string())
            }
            AppleTokenError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("Apple verification unavailable: {}", reason))
            }
        })?;

        if let Some(user) = self.db.get_user_by_apple_id(&identity.subject).await? {
            return self.start_session(user, false).await;
        }

        // An email already owned by another account is not attached here.
        let mut email = identity.email.as_deref().map(normalize_email);
        if let Some(e) = email.as_deref() {
            if self.db.email_exists(e).await? {
                email = None;
            }
        }

        let mut new_user = NewUser {
            display_name: derive_display_name(full_name, identity.email.as_deref()),
            email,
            password_hash: None,
            apple_user_id: Some(identity.subject.clone()),
            invite_code: String::new(),
        };

        let mut outcome = self.insert_user(new_user.clone()).await?;
        if matches!(outcome, InsertUser::Taken(UserKey::Email)) {
            // The email was claimed between the check and the insert.
            new_user.email = None;
            outcome = self.insert_user(new_user).await?;
        }

        let user = match outcome {
            InsertUser::Created(user) => user,
            InsertUser::Taken(key) => {
                // Lost a race with a concurrent first sign-in for the same subject.
                let existing = self.db.get_user_by_apple_id(&identity.subject).await?;
                let user = existing.ok_or_else(|| {
                    tracing::warn!(?key, "Apple account insert clashed without a winner");
                    AppError::Conflict("Account could not be created, please retry".to_string())
                })?;
                return self.start_session(user, false).await;
            }
        };

        tracing::info!(user_id = %user.id, "Apple account registered");
        self.issue(user, true).await
    }

    /// Register an email/password account.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SessionResult> {
        let email = normalize_email(email);
        if self.db.email_exists(&email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let new_user = NewUser {
            display_name: derive_display_name(display_name, Some(&email)),
            password_hash: Some(hash_password(password).await?),
            apple_user_id: None,
            invite_code: String::new(),
            email: Some(email),
        };

        let user = match self.insert_user(new_user).await? {
            InsertUser::Created(user) => user,
            InsertUser::Taken(UserKey::Email) => {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
            InsertUser::Taken(key) => {
                tracing::warn!(?key, "Email account insert clashed on an unexpected key");
                return Err(AppError::Conflict(
                    "Account could not be created, please retry".to_string(),
                ));
            }
        };

        tracing::info!(user_id = %user.id, "Email account registered");
        self.issue(user, true).await
    }

    /// Log in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionResult> {
        let email = normalize_email(email);

        let Some(user) = self.db.get_user_by_email(&email).await? else {
            equalize_timing(password).await?;
            return Err(AppError::InvalidCredential(INVALID_LOGIN.to_string()));
        };

        let Some(hash) = user.password_hash.as_deref() else {
            equalize_timing(password).await?;
            return Err(AppError::InvalidCredential(
                "This account uses Sign in with Apple".to_string(),
            ));
        };

        if !verify_password(password, hash).await? {
            tracing::info!(user_id = %user.id, "Failed password login");
            return Err(AppError::InvalidCredential(INVALID_LOGIN.to_string()));
        }

        self.start_session(user, false).await
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(UserProfile::from(&user))
    }

    pub async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<UserProfile> {
        update.validate()?;
        let user = self
            .db
            .update_profile(user_id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(UserProfile::from(&user))
    }

    /// Hard-delete the account and everything it owns.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
        if !self.db.delete_user(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    /// Session for an existing account.
    async fn start_session(&self, mut user: User, is_new_user: bool) -> Result<SessionResult> {
        if user.is_banned {
            return Err(AppError::InvalidCredential(ACCOUNT_SUSPENDED.to_string()));
        }

        self.db.touch_last_login(user.id).await?;
        user.last_login_at = Some(chrono::Utc::now());
        self.issue(user, is_new_user).await
    }

    async fn issue(&self, user: User, is_new_user: bool) -> Result<SessionResult> {
        let tokens = self.sessions.issue_session(&user).await?;
        Ok(SessionResult {
            user: UserProfile::from(&user),
            tokens,
            is_new_user,
        })
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<InsertUser> {
        insert_with_invite_code(&self.db, new_user, || self.unique_invite_code()).await
    }

    async fn unique_invite_code(&self) -> Result<String> {
        invite_codes::generate_unique(|code| {
            let db = self.db.clone();
            async move { db.invite_code_exists(&code).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_hash_round_trip() {
        let hash = hash_password("password123").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$12$"));
        assert!(verify_password("password123", &hash).await.unwrap());
        assert!(!verify_password("password124", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_equalize_timing_runs_off_the_runtime() {
        equalize_timing("wrong-password").await.unwrap();
        assert!(TIMING_EQUALIZER_HASH.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_verify_against_malformed_hash_is_false() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await.unwrap());
    }
}
