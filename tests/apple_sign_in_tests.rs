// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Apple identity token verification tests.
//!
//! Tokens are signed with the RSA fixture key and checked by a verifier that
//! trusts that key under [`common::TEST_APPLE_KID`].

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use ski_tracker::config::Config;
use ski_tracker::services::apple::APPLE_ISSUER;
use ski_tracker::services::AppleTokenError;
use std::time::{SystemTime, UNIX_EPOCH};

mod common;
use common::{test_apple_verifier, TEST_APPLE_KID, TEST_APPLE_PRIVATE_KEY};

#[derive(Serialize)]
struct AppleClaims<'a> {
    iss: &'a str,
    aud: &'a str,
    sub: &'a str,
    email: Option<&'a str>,
    iat: u64,
    exp: u64,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn sign(claims: &AppleClaims, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_APPLE_PRIVATE_KEY).unwrap();
    encode(&header, claims, &key).unwrap()
}

fn valid_claims<'a>(config: &'a Config) -> AppleClaims<'a> {
    AppleClaims {
        iss: APPLE_ISSUER,
        aud: &config.apple_bundle_id,
        sub: "001234.abcdef.0042",
        email: Some("skier@privaterelay.appleid.com"),
        iat: now(),
        exp: now() + 600,
    }
}

#[tokio::test]
async fn test_valid_token_yields_identity() {
    let config = Config::test_default();
    let verifier = test_apple_verifier(&config);
    let token = sign(&valid_claims(&config), TEST_APPLE_KID);

    let identity = verifier.verify(&token).await.unwrap();

    assert_eq!(identity.subject, "001234.abcdef.0042");
    assert_eq!(
        identity.email.as_deref(),
        Some("skier@privaterelay.appleid.com")
    );
}

#[tokio::test]
async fn test_token_without_email() {
    let config = Config::test_default();
    let verifier = test_apple_verifier(&config);
    let claims = AppleClaims {
        email: None,
        ..valid_claims(&config)
    };

    let identity = verifier.verify(&sign(&claims, TEST_APPLE_KID)).await.unwrap();
    assert!(identity.email.is_none());
}

#[tokio::test]
async fn test_wrong_audience_rejected() {
    let config = Config::test_default();
    let verifier = test_apple_verifier(&config);
    let claims = AppleClaims {
        aud: "com.someone.else",
        ..valid_claims(&config)
    };

    assert!(matches!(
        verifier.verify(&sign(&claims, TEST_APPLE_KID)).await,
        Err(AppleTokenError::Invalid(_))
    ));
}

#[tokio::test]
async fn test_wrong_issuer_rejected() {
    let config = Config::test_default();
    let verifier = test_apple_verifier(&config);
    let claims = AppleClaims {
        iss: "https://accounts.google.com",
        ..valid_claims(&config)
    };

    assert!(matches!(
        verifier.verify(&sign(&claims, TEST_APPLE_KID)).await,
        Err(AppleTokenError::Invalid(_))
    ));
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let config = Config::test_default();
    let verifier = test_apple_verifier(&config);
    let claims = AppleClaims {
        iat: now() - 7200,
        exp: now() - 3600,
        ..valid_claims(&config)
    };

    assert!(matches!(
        verifier.verify(&sign(&claims, TEST_APPLE_KID)).await,
        Err(AppleTokenError::Invalid(_))
    ));
}

#[tokio::test]
async fn test_unknown_kid_rejected() {
    let config = Config::test_default();
    let verifier = test_apple_verifier(&config);
    let token = sign(&valid_claims(&config), "rotated-away");

    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppleTokenError::Invalid(_))
    ));
}

#[tokio::test]
async fn test_hs256_token_rejected() {
    let config = Config::test_default();
    let verifier = test_apple_verifier(&config);
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_APPLE_KID.to_string());
    let token = encode(
        &header,
        &valid_claims(&config),
        &EncodingKey::from_secret(b"guessable"),
    )
    .unwrap();

    assert!(matches!(
        verifier.verify(&token).await,
        Err(AppleTokenError::Invalid(_))
    ));
}
