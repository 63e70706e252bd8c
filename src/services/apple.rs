// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign in with Apple identity token verification.
//!
//! Identity tokens are RS256 JWTs signed with one of the keys Apple publishes
//! at [`APPLE_KEYS_URL`]. The key set is cached for as long as Apple's
//! `Cache-Control: max-age` allows. A token naming a kid we have not seen
//! triggers a refetch, at most once per [`MIN_REFETCH_INTERVAL`].

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

pub const APPLE_ISSUER: &str = "https://appleid.apple.com";
const APPLE_KEYS_URL: &str = "https://appleid.apple.com/auth/keys";

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
/// Used when Apple's response carries no usable `max-age`.
const FALLBACK_MAX_AGE: Duration = Duration::from_secs(60 * 60);
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);
const LEEWAY_SECS: u64 = 60;

/// Identity asserted by a valid Apple identity token.
#[derive(Debug, Clone)]
pub struct AppleIdentity {
    /// Stable Apple user id (`sub`)
    pub subject: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppleTokenError {
    /// Malformed, expired, or minted for another audience.
    #[error("invalid Apple identity token: {0}")]
    Invalid(String),
    /// Apple's key endpoint could not be reached or answered garbage.
    #[error("Apple key service unavailable: {0}")]
    Transient(String),
}

fn invalid(reason: impl Into<String>) -> AppleTokenError {
    AppleTokenError::Invalid(reason.into())
}

fn transient(reason: impl Into<String>) -> AppleTokenError {
    AppleTokenError::Transient(reason.into())
}

/// Apple's signing keys as of one fetch.
struct AppleKeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    max_age: Duration,
}

impl AppleKeySet {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.max_age
    }

    fn key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys.get(kid).cloned()
    }
}

enum KeySource {
    /// Keys fetched from Apple.
    Remote {
        http: reqwest::Client,
        cached: RwLock<Option<AppleKeySet>>,
        fetching: Mutex<()>,
    },
    /// One fixed key, for tests.
    Fixed { kid: String, key: Arc<DecodingKey> },
}

pub struct AppleIdentityVerifier {
    bundle_id: String,
    source: KeySource,
}

impl AppleIdentityVerifier {
    /// Verifier backed by Apple's published key set.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Apple key HTTP client")?;

        tracing::info!(bundle_id = %config.apple_bundle_id, "Apple identity verifier ready");

        Ok(Self {
            bundle_id: config.apple_bundle_id.clone(),
            source: KeySource::Remote {
                http,
                cached: RwLock::new(None),
                fetching: Mutex::new(()),
            },
        })
    }

    /// Verifier that trusts exactly one RSA key under `kid`. Never touches
    /// the network.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        anyhow::ensure!(!kid.trim().is_empty(), "static Apple key id must not be empty");

        Ok(Self {
            bundle_id: config.apple_bundle_id.clone(),
            source: KeySource::Fixed {
                kid,
                key: Arc::new(key),
            },
        })
    }

    /// Check signature, issuer, audience and expiry of an identity token.
    pub async fn verify(&self, identity_token: &str) -> Result<AppleIdentity, AppleTokenError> {
        let token = identity_token.trim();
        if token.is_empty() {
            return Err(invalid("token is empty"));
        }

        let header = decode_header(token).map_err(|e| invalid(format!("bad JWT header: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(invalid(format!("unexpected alg {:?}", header.alg)));
        }
        let kid = header.kid.ok_or_else(|| invalid("missing kid"))?;

        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[APPLE_ISSUER]);
        validation.set_audience(&[self.bundle_id.as_str()]);
        validation.leeway = LEEWAY_SECS;

        let claims = decode::<AppleClaims>(token, &key, &validation)
            .map_err(|e| invalid(format!("rejected: {e}")))?
            .claims;

        let subject = claims.sub.trim().to_string();
        if subject.is_empty() {
            return Err(invalid("empty sub"));
        }

        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .filter(|_| claims.email_verified != Some(false));

        Ok(AppleIdentity { subject, email })
    }

    async fn signing_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AppleTokenError> {
        let (http, cached, fetching) = match &self.source {
            KeySource::Fixed { kid: fixed, key } if fixed == kid => return Ok(key.clone()),
            KeySource::Fixed { .. } => return Err(invalid(format!("unknown kid {kid}"))),
            KeySource::Remote {
                http,
                cached,
                fetching,
            } => (http, cached, fetching),
        };

        if let Some(key) = cached
            .read()
            .await
            .as_ref()
            .filter(|set| set.is_fresh())
            .and_then(|set| set.key(kid))
        {
            return Ok(key);
        }

        let _fetching = fetching.lock().await;

        // Another caller may have refetched while we waited.
        {
            let current = cached.read().await;
            if let Some(set) = current.as_ref() {
                if let Some(key) = set.key(kid).filter(|_| set.is_fresh()) {
                    return Ok(key);
                }
                if set.is_fresh() && set.fetched_at.elapsed() < MIN_REFETCH_INTERVAL {
                    return Err(invalid(format!("unknown kid {kid}")));
                }
            }
        }

        let set = fetch_key_set(http).await?;
        let key = set.key(kid);
        *cached.write().await = Some(set);

        key.ok_or_else(|| invalid(format!("unknown kid {kid}")))
    }
}

async fn fetch_key_set(http: &reqwest::Client) -> Result<AppleKeySet, AppleTokenError> {
    let response = http
        .get(APPLE_KEYS_URL)
        .send()
        .await
        .map_err(|e| transient(format!("key fetch failed: {e}")))?;

    if !response.status().is_success() {
        return Err(transient(format!("key fetch returned {}", response.status())));
    }

    let max_age = response
        .headers()
        .get(reqwest::header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_max_age)
        .unwrap_or(FALLBACK_MAX_AGE);

    let body: AppleKeys = response
        .json()
        .await
        .map_err(|e| transient(format!("malformed key set: {e}")))?;

    let keys = rsa_signing_keys(body);
    if keys.is_empty() {
        return Err(transient("key set has no RS256 keys"));
    }

    tracing::debug!(keys = keys.len(), max_age_secs = max_age.as_secs(), "Fetched Apple keys");

    Ok(AppleKeySet {
        keys,
        fetched_at: Instant::now(),
        max_age,
    })
}

#[derive(Deserialize)]
struct AppleKeys {
    keys: Vec<AppleKey>,
}

#[derive(Deserialize)]
struct AppleKey {
    kid: String,
    kty: String,
    #[serde(default)]
    alg: Option<String>,
    #[serde(rename = "use", default)]
    key_use: Option<String>,
    n: String,
    e: String,
}

#[derive(Deserialize)]
struct AppleClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    email_verified: Option<bool>,
}

/// Apple sends boolean claims either as JSON booleans or as `"true"`/`"false"`.
fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Bool(b)) => Some(b),
        Some(Loose::Text(s)) => s.parse().ok(),
        None => None,
    })
}

fn rsa_signing_keys(set: AppleKeys) -> HashMap<String, Arc<DecodingKey>> {
    set.keys
        .into_iter()
        .filter(|k| k.kty == "RSA" && !k.kid.is_empty())
        .filter(|k| k.alg.as_deref().unwrap_or("RS256") == "RS256")
        .filter(|k| k.key_use.as_deref().unwrap_or("sig") == "sig")
        .filter_map(|k| match DecodingKey::from_rsa_components(&k.n, &k.e) {
            Ok(key) => Some((k.kid, Arc::new(key))),
            Err(e) => {
                tracing::warn!(kid = %k.kid, error = %e, "Ignoring malformed Apple key");
                None
            }
        })
        .collect()
}

fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .filter_map(|d| d.trim().strip_prefix("max-age="))
        .find_map(|v| v.trim_matches('"').parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_age() {
        assert_eq!(
            parse_max_age("public, max-age=86400, must-revalidate"),
            Some(Duration::from_secs(86400))
        );
        assert_eq!(parse_max_age("max-age=\"120\""), Some(Duration::from_secs(120)));
        assert_eq!(parse_max_age("no-cache"), None);
        assert_eq!(parse_max_age("max-age=soon"), None);
    }

    #[test]
    fn test_only_rsa_signing_keys_are_kept() {
        let set: AppleKeys = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kid": "ec", "kty": "EC", "n": "", "e": "" },
                { "kid": "hs", "kty": "RSA", "alg": "HS256", "n": "AQAB", "e": "AQAB" },
                { "kid": "enc", "kty": "RSA", "use": "enc", "n": "AQAB", "e": "AQAB" }
            ]
        }))
        .unwrap();

        assert!(rsa_signing_keys(set).is_empty());
    }

    #[test]
    fn test_claims_accept_string_booleans() {
        let claims: AppleClaims = serde_json::from_value(serde_json::json!({
            "sub": "001234.abc",
            "email": "x@privaterelay.appleid.com",
            "email_verified": "true"
        }))
        .unwrap();
        assert_eq!(claims.email_verified, Some(true));

        let claims: AppleClaims = serde_json::from_value(serde_json::json!({
            "sub": "001234.abc",
            "email_verified": false
        }))
        .unwrap();
        assert_eq!(claims.email_verified, Some(false));

        let claims: AppleClaims =
            serde_json::from_value(serde_json::json!({ "sub": "001234.abc" })).unwrap();
        assert_eq!(claims.email_verified, None);
    }

    #[tokio::test]
    async fn test_garbage_is_invalid() {
        let verifier = AppleIdentityVerifier::new(&Config::test_default()).unwrap();
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(AppleTokenError::Invalid(_))
        ));
        assert!(matches!(
            verifier.verify("   ").await,
            Err(AppleTokenError::Invalid(_))
        ));
    }
}
