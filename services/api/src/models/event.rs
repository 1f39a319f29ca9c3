//! Concert listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{Validate, ValidationErrors, validate_required};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    /// Identifier in the listing source
    pub external_id: String,
    pub title: String,
    pub venue: String,
    pub date: DateTime<Utc>,
    pub artist_name: String,
    pub location: String,
    pub metadata: Option<serde_json::Value>,
}

/// Request body for creating an event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub external_id: String,
    pub title: String,
    pub venue: String,
    /// RFC 3339 timestamp
    pub date: DateTime<Utc>,
    pub artist_name: String,
    pub location: String,
    pub metadata: Option<serde_json::Value>,
}

impl Validate for NewEvent {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("externalId", validate_required(&self.external_id, "External id"));
        errors.check("title", validate_required(&self.title, "Title"));
        errors.check("venue", validate_required(&self.venue, "Venue"));
        errors.check("artistName", validate_required(&self.artist_name, "Artist name"));
        errors.check("location", validate_required(&self.location, "Location"));
        errors.into_result()
    }
}
