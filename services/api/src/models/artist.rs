//! Catalog artists

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{
    Validate, ValidationErrors, validate_genres, validate_required, validate_url,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating an artist
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtist {
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub image_url: Option<String>,
}

impl Validate for NewArtist {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("name", validate_required(&self.name, "Name"));
        errors.check("genres", validate_genres(&self.genres));
        if let Some(url) = &self.image_url {
            errors.check("imageUrl", validate_url(url));
        }
        errors.into_result()
    }
}
