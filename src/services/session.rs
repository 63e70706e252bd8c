// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: issue, authenticate, rotate and revoke token pairs.
//!
//! Access and refresh tokens are HS256 JWTs signed with distinct keys, so a
//! refresh token can never pass as an access token. Refresh tokens are also
//! persisted (as digests) and are single-use: every refresh deletes the
//! presented token and issues a fresh pair.

use crate::config::Config;
use crate::db::{refresh_tokens, Db};
use crate::error::{AppError, Result};
use crate::models::{TokenPair, User};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgConnection;
use uuid::Uuid;

/// Live refresh tokens retained per user.
pub const MAX_REFRESH_TOKENS_PER_USER: i64 = 5;

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthenticated)
    }
}

/// SHA-256 hex digest under which a refresh token is stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub struct SessionManager {
    db: Db,
    access: SigningKeys,
    refresh: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionManager {
    pub fn new(config: &Config, db: Db) -> Self {
        Self {
            db,
            access: SigningKeys::from_secret(&config.jwt_access_secret),
            refresh: SigningKeys::from_secret(&config.jwt_refresh_secret),
            access_ttl: Duration::seconds(config.access_token_ttl_secs as i64),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
        }
    }

    /// Issue a token pair, persist the refresh token and prune the user's
    /// older refresh tokens down to [`MAX_REFRESH_TOKENS_PER_USER`].
    pub async fn issue_session(&self, user: &User) -> Result<TokenPair> {
        let mut tx = self.db.begin().await?;
        let pair = self.issue_on(&mut tx, user).await?;
        tx.commit().await?;
        Ok(pair)
    }

    async fn issue_on(&self, conn: &mut PgConnection, user: &User) -> Result<TokenPair> {
        let access_token = self.sign_access_token(user)?;
        let (refresh_token, expires_at) = self.sign_refresh_token(user)?;

        refresh_tokens::insert(conn, user.id, &hash_token(&refresh_token), expires_at).await?;
        let pruned = refresh_tokens::prune(conn, user.id, MAX_REFRESH_TOKENS_PER_USER).await?;

        tracing::debug!(user_id = %user.id, pruned, "Session issued");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.num_seconds().max(0) as u64,
        })
    }

    /// Resolve an access token to its user. Runs on every protected request,
    /// so a ban takes effect immediately.
    pub async fn authenticate(&self, access_token: &str) -> Result<User> {
        let claims = self.decode_access_token(access_token)?;
        let user = self
            .db
            .get_user(claims.user_id()?)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if user.is_banned {
            return Err(AppError::Forbidden("Account has been suspended".to_string()));
        }

        Ok(user)
    }

    /// Exchange a refresh token for a new pair. The presented token is
    /// consumed whether or not it has expired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.decode_refresh_token(refresh_token)?;
        let user = self
            .db
            .get_user(claims.user_id()?)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if user.is_banned {
            return Err(AppError::Forbidden("Account has been suspended".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let Some(expires_at) =
            refresh_tokens::consume(&mut tx, user.id, &hash_token(refresh_token)).await?
        else {
            tracing::warn!(user_id = %user.id, "Refresh token not found (revoked or reused)");
            return Err(AppError::Unauthenticated);
        };

        if expires_at <= Utc::now() {
            tx.commit().await?;
            return Err(AppError::Unauthenticated);
        }

        let pair = self.issue_on(&mut tx, &user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "Session refreshed");
        Ok(pair)
    }

    /// Revoke one refresh token, or all of the user's tokens when none is given.
    pub async fn logout(&self, user_id: Uuid, refresh_token: Option<&str>) -> Result<u64> {
        let revoked = match refresh_token {
            Some(token) => {
                self.db
                    .revoke_refresh_token(user_id, &hash_token(token))
                    .await?
            }
            None => self.db.revoke_all_refresh_tokens(user_id).await?,
        };

        tracing::info!(user_id = %user_id, revoked, everywhere = refresh_token.is_none(), "Logged out");
        Ok(revoked)
    }

    pub fn sign_access_token(&self, user: &User) -> Result<String> {
        let (token, _) = sign(user, &self.access.encoding, self.access_ttl)?;
        Ok(token)
    }

    /// Sign a refresh token, returning it with its expiry.
    pub fn sign_refresh_token(&self, user: &User) -> Result<(String, DateTime<Utc>)> {
        sign(user, &self.refresh.encoding, self.refresh_ttl)
    }

    pub fn decode_access_token(&self, token: &str) -> Result<Claims> {
        verify(token, &self.access.decoding)
    }

    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims> {
        verify(token, &self.refresh.decoding)
    }
}

fn sign(user: &User, key: &EncodingKey, ttl: Duration) -> Result<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expires_at = now + ttl;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT signing failed: {}", e)))?;
    Ok((token, expires_at))
}

fn verify(token: &str, key: &DecodingKey) -> Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: Some("alice@example.com".to_string()),
            password_hash: None,
            apple_user_id: None,
            display_name: "alice".to_string(),
            home_resort: None,
            units: "metric".to_string(),
            weight_kg: None,
            haptics_enabled: true,
            battery_saver: false,
            invite_code: "SKI-ICE-1234".to_string(),
            is_banned: false,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(&Config::test_default(), Db::new_mock())
    }

    #[test]
    fn test_access_token_round_trip() {
        let sessions = manager();
        let user = test_user();

        let token = sessions.sign_access_token(&user).unwrap();
        let claims = sessions.decode_access_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let sessions = manager();
        let user = test_user();

        let (refresh, expires_at) = sessions.sign_refresh_token(&user).unwrap();
        assert!(expires_at > Utc::now() + Duration::days(29));
        assert!(sessions.decode_refresh_token(&refresh).is_ok());
        assert!(matches!(
            sessions.decode_access_token(&refresh),
            Err(AppError::Unauthenticated)
        ));

        let access = sessions.sign_access_token(&user).unwrap();
        assert!(sessions.decode_refresh_token(&access).is_err());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let sessions = manager();
        let user = test_user();

        let (a, _) = sessions.sign_refresh_token(&user).unwrap();
        let (b, _) = sessions.sign_refresh_token(&user).unwrap();
        assert_ne!(a, b);
        assert_ne!(hash_token(&a), hash_token(&b));
    }

    #[test]
    fn test_expired_token_rejected() {
        let sessions = manager();
        let user = test_user();
        let (token, _) = sign(&user, &sessions.access.encoding, Duration::hours(-2)).unwrap();

        assert!(matches!(
            sessions.decode_access_token(&token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let digest = hash_token("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage_before_touching_db() {
        let sessions = manager();
        assert!(matches!(
            sessions.refresh("not.a.token").await,
            Err(AppError::Unauthenticated)
        ));
    }
}
