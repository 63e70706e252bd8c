// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session token tests.
//!
//! These tests decode tokens issued by the session manager with a plain
//! HS256 validator, catching claim-format changes early.

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use ski_tracker::config::Config;
use ski_tracker::db::Db;
use ski_tracker::models::User;
use ski_tracker::services::SessionManager;
use uuid::Uuid;

/// Claims structure that clients and the middleware rely on.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    exp: usize,
    iat: usize,
    jti: String,
}

fn test_user(email: Option<&str>) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.map(str::to_string),
        password_hash: None,
        apple_user_id: Some("001234.abcdef.0042".to_string()),
        display_name: "Skier".to_string(),
        home_resort: None,
        units: "metric".to_string(),
        weight_kg: None,
        haptics_enabled: true,
        battery_saver: false,
        invite_code: "SKI-FOX-4242".to_string(),
        is_banned: false,
        created_at: now,
        updated_at: now,
        last_login_at: None,
    }
}

#[test]
fn test_access_token_claims() {
    let config = Config::test_default();
    let sessions = SessionManager::new(&config, Db::new_mock());
    let user = test_user(Some("powder@example.com"));

    let token = sessions.sign_access_token(&user).unwrap();

    let key = DecodingKey::from_secret(&config.jwt_access_secret);
    let claims = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
        .expect("access token decodes with the access secret")
        .claims;

    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.email.as_deref(), Some("powder@example.com"));
    assert_eq!(claims.exp - claims.iat, config.access_token_ttl_secs as usize);
    assert!(Uuid::parse_str(&claims.jti).is_ok());
}

#[test]
fn test_refresh_token_claims_and_lifetime() {
    let config = Config::test_default();
    let sessions = SessionManager::new(&config, Db::new_mock());
    let user = test_user(None);

    let (token, expires_at) = sessions.sign_refresh_token(&user).unwrap();

    let key = DecodingKey::from_secret(&config.jwt_refresh_secret);
    let claims = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
        .expect("refresh token decodes with the refresh secret")
        .claims;

    assert_eq!(claims.sub, user.id.to_string());
    assert!(claims.email.is_none());
    assert_eq!(claims.exp as i64, expires_at.timestamp());
    assert_eq!(
        (claims.exp - claims.iat) as i64,
        config.refresh_token_ttl_days * 24 * 60 * 60
    );
}

#[test]
fn test_secrets_are_not_interchangeable() {
    let config = Config::test_default();
    let sessions = SessionManager::new(&config, Db::new_mock());
    let user = test_user(Some("powder@example.com"));

    let access = sessions.sign_access_token(&user).unwrap();
    let wrong_key = DecodingKey::from_secret(&config.jwt_refresh_secret);
    assert!(decode::<Claims>(&access, &wrong_key, &Validation::new(Algorithm::HS256)).is_err());
}

#[test]
fn test_session_manager_uses_access_ttl_from_config() {
    let mut config = Config::test_default();
    config.access_token_ttl_secs = 120;
    let sessions = SessionManager::new(&config, Db::new_mock());

    let token = sessions
        .sign_access_token(&test_user(Some("a@example.com")))
        .unwrap();
    let claims = sessions.decode_access_token(&token).unwrap();

    assert_eq!(claims.exp - claims.iat, 120);
}
