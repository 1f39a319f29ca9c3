//! Album reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{Validate, ValidationErrors, validate_rating, validate_required};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    /// Catalog album id or an external album identifier
    pub album_id: String,
    pub rating: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a review; the author is the logged-in user
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub album_id: String,
    pub rating: i32,
    pub review: Option<String>,
}

impl Validate for CreateReviewRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("albumId", validate_required(&self.album_id, "Album id"));
        errors.check("rating", validate_rating(self.rating));
        errors.into_result()
    }
}

/// Insert payload for a review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: i32,
    pub album_id: String,
    pub rating: i32,
    pub review: Option<String>,
}

impl NewReview {
    pub fn from_request(user_id: i32, request: CreateReviewRequest) -> Self {
        Self {
            user_id,
            album_id: request.album_id,
            rating: request.rating,
            review: request.review.filter(|text| !text.trim().is_empty()),
        }
    }
}
