// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use ski_tracker::config::Config;
use ski_tracker::db::Db;
use ski_tracker::routes::create_router;
use ski_tracker::services::AppleIdentityVerifier;
use ski_tracker::AppState;
use std::sync::Arc;

/// Key id of the RSA fixture standing in for Apple's signing key.
#[allow(dead_code)]
pub const TEST_APPLE_KID: &str = "test-apple-kid";

#[allow(dead_code)]
pub const TEST_APPLE_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/apple_test_key.pem");

#[allow(dead_code)]
pub const TEST_APPLE_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/apple_test_key.pub.pem");

/// Check if a test database is available via environment variable.
#[allow(dead_code)]
pub fn database_available() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

/// Skip test with message if no test database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        if !crate::common::database_available() {
            eprintln!("⚠️  Skipping: TEST_DATABASE_URL not set");
            return;
        }
    };
}

/// Apple verifier that trusts the fixture key instead of Apple's JWKS.
#[allow(dead_code)]
pub fn test_apple_verifier(config: &Config) -> Arc<AppleIdentityVerifier> {
    let key = DecodingKey::from_rsa_pem(TEST_APPLE_PUBLIC_KEY).expect("fixture public key");
    Arc::new(
        AppleIdentityVerifier::new_with_static_key(config, TEST_APPLE_KID, key)
            .expect("static Apple verifier"),
    )
}

/// Apple identity token for `subject`, signed with the fixture key and valid
/// for ten minutes.
#[allow(dead_code)]
pub fn apple_identity_token(config: &Config, subject: &str, email: Option<&str>) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = serde_json::json!({
        "iss": ski_tracker::services::apple::APPLE_ISSUER,
        "aud": config.apple_bundle_id,
        "sub": subject,
        "email": email,
        "iat": now,
        "exp": now + 600,
    });

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_APPLE_KID.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_APPLE_PRIVATE_KEY).expect("fixture private key");
    encode(&header, &claims, &key).expect("sign Apple token")
}

/// Fresh Apple subject id for test isolation.
#[allow(dead_code)]
pub fn unique_apple_subject() -> String {
    format!("001234.{}.0042", uuid::Uuid::new_v4().simple())
}

/// Connect to the test database and apply migrations.
#[allow(dead_code)]
pub async fn test_db() -> Db {
    let config = Config::test_default();
    let db = Db::connect(&config)
        .await
        .expect("Failed to connect to test database");
    db.migrate().await.expect("Failed to apply migrations");
    db
}

/// Shared state backed by the test database.
#[allow(dead_code)]
pub async fn test_state() -> Arc<AppState> {
    let config = Config::test_default();
    let db = test_db().await;
    let apple = test_apple_verifier(&config);
    Arc::new(AppState::new(config, db, apple))
}

/// Create a test app with an offline database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let apple = test_apple_verifier(&config);
    let state = Arc::new(AppState::new(config, Db::new_mock(), apple));

    (create_router(state.clone()), state)
}

/// Unique email for test isolation against a shared database.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
