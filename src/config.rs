// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; a `.env` file is honored for local
//! development.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// PostgreSQL connection string
    pub database_url: String,
    /// Maximum pooled database connections
    pub db_max_connections: u32,
    /// Server port
    pub port: u16,
    /// App bundle id, the expected audience of Apple identity tokens
    pub apple_bundle_id: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in days
    pub refresh_token_ttl_days: i64,
    /// Whether the process runs in production (hides internal error details)
    pub production: bool,

    // --- Secrets ---
    /// HS256 key for access tokens (raw bytes)
    pub jwt_access_secret: Vec<u8>,
    /// HS256 key for refresh tokens (raw bytes), distinct from the access key
    pub jwt_refresh_secret: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            database_url: env::var("TEST_DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/ski_tracker_test".to_string()),
            db_max_connections: 5,
            port: 8080,
            apple_bundle_id: "com.example.skitracker".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_days: 30,
            production: false,
            jwt_access_secret: b"test_access_key_32_bytes_minimum!".to_vec(),
            jwt_refresh_secret: b"test_refresh_key_32_bytes_minimum".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_access_secret = required("JWT_ACCESS_SECRET")?.into_bytes();
        let jwt_refresh_secret = required("JWT_REFRESH_SECRET")?.into_bytes();
        if jwt_access_secret == jwt_refresh_secret {
            return Err(ConfigError::Invalid(
                "JWT_REFRESH_SECRET",
                "must differ from JWT_ACCESS_SECRET".to_string(),
            ));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,
            port: parsed_or("PORT", 8080)?,
            apple_bundle_id: required("APPLE_BUNDLE_ID")?,
            access_token_ttl_secs: parsed_or("ACCESS_TOKEN_TTL_SECS", 3600)?,
            refresh_token_ttl_days: parsed_or("REFRESH_TOKEN_TTL_DAYS", 30)?,
            production: env::var("APP_ENV")
                .map(|v| v.trim().eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            jwt_access_secret,
            jwt_refresh_secret,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("DATABASE_URL", "postgres://localhost/ski");
        env::set_var("JWT_ACCESS_SECRET", "access_key_for_tests_only_32b!!");
        env::set_var("JWT_REFRESH_SECRET", "refresh_key_for_tests_only_32b!");
        env::set_var("APPLE_BUNDLE_ID", "com.example.ski");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.database_url, "postgres://localhost/ski");
        assert_eq!(config.apple_bundle_id, "com.example.ski");
        assert_eq!(config.port, 8080);
        assert_eq!(config.refresh_token_ttl_days, 30);
        assert_ne!(config.jwt_access_secret, config.jwt_refresh_secret);
    }

    #[test]
    fn test_default_keys_are_distinct() {
        let config = Config::test_default();
        assert_ne!(config.jwt_access_secret, config.jwt_refresh_secret);
        assert!(!config.production);
    }
}
