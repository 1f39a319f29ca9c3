//! Album repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

use super::AlbumRepository;
use crate::models::{Album, AlbumQuery, NewAlbum};

#[derive(Clone)]
pub struct PgAlbumRepository {
    pool: PgPool,
}

impl PgAlbumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl AlbumRepository for PgAlbumRepository {
    async fn create(&self, album: &NewAlbum) -> DatabaseResult<Album> {
        sqlx::query_as::<_, Album>(
            r#"
            INSERT INTO albums (title, artist_id, cover_url, release_date, genres)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, artist_id, cover_url, release_date, genres, created_at
            "#,
        )
        .bind(album.title.trim())
        .bind(album.artist_id)
        .bind(&album.cover_url)
        .bind(album.release_date)
        .bind(&album.genres)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<Album>> {
        sqlx::query_as::<_, Album>(
            r#"
            SELECT id, title, artist_id, cover_url, release_date, genres, created_at
            FROM albums
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list(&self, query: &AlbumQuery) -> DatabaseResult<Vec<Album>> {
        sqlx::query_as::<_, Album>(
            r#"
            SELECT id, title, artist_id, cover_url, release_date, genres, created_at
            FROM albums
            WHERE ($1::INTEGER IS NULL OR artist_id = $1)
              AND ($2::TEXT IS NULL OR title ILIKE $2)
            ORDER BY title, id
            "#,
        )
        .bind(query.artist_id)
        .bind(query.search_term().map(contains_pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM albums WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("blue"), "%blue%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\"), "%c:\\\\%");
    }
}
