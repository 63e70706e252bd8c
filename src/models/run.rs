// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ski run model for storage and API.
//!
//! Distances are kilometres, speeds km/h, elevations metres.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Piste difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Green,
    Blue,
    Black,
    DoubleBlack,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Green => "green",
            Difficulty::Blue => "blue",
            Difficulty::Black => "black",
            Difficulty::DoubleBlack => "double_black",
        }
    }
}

fn default_run_name() -> String {
    "Ski Run".to_string()
}

/// Run as uploaded by a client. `clientId` is the idempotency key.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_run_window"))]
pub struct RunUpload {
    #[serde(alias = "id")]
    #[validate(length(min = 1, max = 128))]
    pub client_id: String,
    #[serde(default = "default_run_name")]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub resort_name: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub resort_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub resort_lon: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub distance: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub max_speed: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub avg_speed: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub elevation_drop: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub start_elevation: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub end_elevation: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub duration_secs: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub points: i64,
    #[validate(range(min = 0))]
    pub calories: Option<i32>,
    #[validate(range(min = 0))]
    pub avg_heart_rate: Option<i32>,
    #[validate(range(min = 0))]
    pub max_heart_rate: Option<i32>,
    pub difficulty: Option<Difficulty>,
    /// Route geodata, stored verbatim
    pub route: Option<serde_json::Value>,
}

fn validate_run_window(run: &RunUpload) -> Result<(), ValidationError> {
    if run.client_id.trim().is_empty() {
        return Err(ValidationError::new("client_id_blank")
            .with_message("clientId must not be blank".into()));
    }

    if let Some(end) = run.end_time {
        if end < run.start_time {
            return Err(ValidationError::new("end_before_start")
                .with_message("endTime must not precede startTime".into()));
        }
    }

    Ok(())
}

/// Full run record, including the route payload.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: String,
    pub name: String,
    pub resort_name: Option<String>,
    pub resort_lat: Option<f64>,
    pub resort_lon: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance: f64,
    pub max_speed: f64,
    pub avg_speed: f64,
    pub elevation_drop: f64,
    pub start_elevation: f64,
    pub end_elevation: f64,
    pub duration_secs: f64,
    pub points: i64,
    pub calories: Option<i32>,
    pub avg_heart_rate: Option<i32>,
    pub max_heart_rate: Option<i32>,
    pub difficulty: Option<String>,
    pub route: Option<serde_json::Value>,
    #[serde(skip)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Run as shown in list views: metrics only, no route payload.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: Uuid,
    pub client_id: String,
    pub name: String,
    pub resort_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance: f64,
    pub max_speed: f64,
    pub avg_speed: f64,
    pub elevation_drop: f64,
    pub duration_secs: f64,
    pub points: i64,
    pub difficulty: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an idempotent upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub server_id: Uuid,
    pub created: bool,
}

/// Per-item status in a batch upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchItemStatus {
    Created,
    Updated,
    Error,
}

/// One entry of a batch upload result, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub index: usize,
    pub client_id: Option<String>,
    pub status: BatchItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Change marker for pull-sync.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusEntry {
    pub id: Uuid,
    pub client_id: String,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

/// Filters for listing runs.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub resort: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upload(value: serde_json::Value) -> RunUpload {
        serde_json::from_value(value).expect("valid run JSON")
    }

    #[test]
    fn test_run_upload_defaults_and_alias() {
        let run = upload(json!({
            "id": "R1",
            "startTime": "2026-01-10T09:00:00Z",
            "distance": 5.2
        }));

        assert_eq!(run.client_id, "R1");
        assert_eq!(run.name, "Ski Run");
        assert_eq!(run.distance, 5.2);
        assert_eq!(run.points, 0);
        assert!(run.validate().is_ok());
    }

    #[test]
    fn test_run_upload_rejects_negative_metric() {
        let run = upload(json!({
            "clientId": "R2",
            "startTime": "2026-01-10T09:00:00Z",
            "maxSpeed": -3.0
        }));
        assert!(run.validate().is_err());
    }

    #[test]
    fn test_run_upload_rejects_end_before_start() {
        let run = upload(json!({
            "clientId": "R3",
            "startTime": "2026-01-10T09:00:00Z",
            "endTime": "2026-01-10T08:00:00Z"
        }));
        let err = run.validate().unwrap_err();
        assert!(err.errors().contains_key("__all__"));
    }

    #[test]
    fn test_run_upload_requires_client_id() {
        let result = serde_json::from_value::<RunUpload>(json!({
            "startTime": "2026-01-10T09:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_difficulty_wire_names() {
        let run = upload(json!({
            "clientId": "R4",
            "startTime": "2026-01-10T09:00:00Z",
            "difficulty": "double_black"
        }));
        assert_eq!(run.difficulty, Some(Difficulty::DoubleBlack));
        assert_eq!(Difficulty::DoubleBlack.as_str(), "double_black");
    }
}
