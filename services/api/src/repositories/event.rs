//! Event repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

use super::EventRepository;
use crate::models::{Event, NewEvent};

const EVENT_COLUMNS: &str = "id, external_id, title, venue, date, artist_name, location, metadata";

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn create(&self, event: &NewEvent) -> DatabaseResult<Event> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (external_id, title, venue, date, artist_name, location, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&event.external_id)
        .bind(event.title.trim())
        .bind(event.venue.trim())
        .bind(event.date)
        .bind(event.artist_name.trim())
        .bind(event.location.trim())
        .bind(&event.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list(&self) -> DatabaseResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list_by_location(&self, location: &str) -> DatabaseResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE location = $1 ORDER BY date, id"
        ))
        .bind(location)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}
