// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Fallback display name when neither a name nor an email is available.
pub const DEFAULT_DISPLAY_NAME: &str = "Skier";

/// User record stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    /// Internal id, generated at creation
    pub id: Uuid,
    /// Case-folded email (absent for Apple-only accounts that hid it)
    pub email: Option<String>,
    /// bcrypt hash (absent for Apple-only accounts)
    pub password_hash: Option<String>,
    /// Apple `sub` claim
    pub apple_user_id: Option<String>,
    pub display_name: String,
    pub home_resort: Option<String>,
    /// `metric` or `imperial`
    pub units: String,
    pub weight_kg: Option<f64>,
    pub haptics_enabled: bool,
    pub battery_saver: bool,
    /// Human-shareable code used to add this user as a friend
    pub invite_code: String,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub apple_user_id: Option<String>,
    pub display_name: String,
    pub invite_code: String,
}

/// Unit system preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

/// Profile as returned to the owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: String,
    pub home_resort: Option<String>,
    pub units: String,
    pub weight_kg: Option<f64>,
    pub haptics_enabled: bool,
    pub battery_saver: bool,
    pub invite_code: String,
    pub has_password: bool,
    pub apple_linked: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            home_resort: user.home_resort.clone(),
            units: user.units.clone(),
            weight_kg: user.weight_kg,
            haptics_enabled: user.haptics_enabled,
            battery_saver: user.battery_saver,
            invite_code: user.invite_code.clone(),
            has_password: user.password_hash.is_some(),
            apple_linked: user.apple_user_id.is_some(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Partial profile update. Absent fields are left unchanged; an empty
/// `homeResort` clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_profile_update"))]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50))]
    pub display_name: Option<String>,
    #[validate(length(max = 100))]
    pub home_resort: Option<String>,
    pub units: Option<Units>,
    #[validate(range(min = 20.0, max = 300.0))]
    pub weight_kg: Option<f64>,
    pub haptics_enabled: Option<bool>,
    pub battery_saver: Option<bool>,
}

fn validate_profile_update(update: &ProfileUpdate) -> Result<(), ValidationError> {
    if update
        .display_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(ValidationError::new("display_name_blank")
            .with_message("displayName must not be blank".into()));
    }
    Ok(())
}

/// Case-fold an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Pick a display name: the supplied full name, else the email local part,
/// else [`DEFAULT_DISPLAY_NAME`].
pub fn derive_display_name(full_name: Option<&str>, email: Option<&str>) -> String {
    if let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.chars().take(50).collect();
    }

    email
        .and_then(|e| e.split('@').next())
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .map(|local| local.chars().take(50).collect())
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(
            derive_display_name(Some("  Jane Doe "), Some("jd@example.com")),
            "Jane Doe"
        );
    }

    #[test]
    fn test_display_name_falls_back_to_email_then_default() {
        assert_eq!(
            derive_display_name(Some("   "), Some("powder@example.com")),
            "powder"
        );
        assert_eq!(derive_display_name(None, None), DEFAULT_DISPLAY_NAME);
        assert_eq!(derive_display_name(None, Some("@example.com")), DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_profile_update_rejects_bad_weight() {
        let update = ProfileUpdate {
            weight_kg: Some(5.0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_profile_update_rejects_blank_display_name() {
        let update = ProfileUpdate {
            display_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = ProfileUpdate {
            display_name: Some(" Powder Hound ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
