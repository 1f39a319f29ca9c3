//! Artist repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

use super::ArtistRepository;
use crate::models::{Artist, NewArtist};

#[derive(Clone)]
pub struct PgArtistRepository {
    pool: PgPool,
}

impl PgArtistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistRepository for PgArtistRepository {
    async fn create(&self, artist: &NewArtist) -> DatabaseResult<Artist> {
        sqlx::query_as::<_, Artist>(
            r#"
            INSERT INTO artists (name, genres, image_url)
            VALUES ($1, $2, $3)
            RETURNING id, name, genres, image_url, created_at
            "#,
        )
        .bind(artist.name.trim())
        .bind(&artist.genres)
        .bind(&artist.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<Artist>> {
        sqlx::query_as::<_, Artist>(
            "SELECT id, name, genres, image_url, created_at FROM artists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list(&self) -> DatabaseResult<Vec<Artist>> {
        sqlx::query_as::<_, Artist>(
            "SELECT id, name, genres, image_url, created_at FROM artists ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM artists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}
