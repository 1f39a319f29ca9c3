//! Review repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

use super::ReviewRepository;
use crate::models::{NewReview, Review};

#[derive(Clone)]
pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn create(&self, review: &NewReview) -> DatabaseResult<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (user_id, album_id, rating, review)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, album_id, rating, review, created_at
            "#,
        )
        .bind(review.user_id)
        .bind(&review.album_id)
        .bind(review.rating)
        .bind(&review.review)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list(&self) -> DatabaseResult<Vec<Review>> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT id, user_id, album_id, rating, review, created_at
            FROM reviews
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }
}
