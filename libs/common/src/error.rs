//! Custom error types for the common library
//!
//! `DatabaseError` is the error every repository returns, so the HTTP layer
//! can map persistence failures without knowing about `sqlx`.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A uniqueness constraint rejected the write
    #[error("Database conflict: {0}")]
    Conflict(String),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Classify a query failure, separating unique-constraint violations
    /// from everything else.
    pub fn from_query(error: SqlxError) -> Self {
        let conflict = error
            .as_database_error()
            .filter(|db_error| db_error.is_unique_violation())
            .map(|db_error| {
                db_error
                    .constraint()
                    .unwrap_or_else(|| db_error.message())
                    .to_string()
            });

        match conflict {
            Some(constraint) => DatabaseError::Conflict(constraint),
            None => DatabaseError::Query(error),
        }
    }

    /// Whether this error came from a uniqueness constraint
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
