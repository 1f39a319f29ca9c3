//! Catalog albums

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{
    Validate, ValidationErrors, validate_genres, validate_required, validate_url,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: i32,
    pub title: String,
    pub artist_id: i32,
    pub cover_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating an album
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlbum {
    pub title: String,
    pub artist_id: i32,
    pub cover_url: Option<String>,
    /// `YYYY-MM-DD`
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Validate for NewAlbum {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("title", validate_required(&self.title, "Title"));
        errors.check("genres", validate_genres(&self.genres));
        if let Some(url) = &self.cover_url {
            errors.check("coverUrl", validate_url(url));
        }
        errors.into_result()
    }
}

/// Query parameters for listing albums
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumQuery {
    pub artist_id: Option<i32>,
    /// Case-insensitive title substring
    pub search: Option<String>,
}

impl AlbumQuery {
    /// Search term, ignoring blank input
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
