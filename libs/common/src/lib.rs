//! Common library for the Disc music discovery service
//!
//! Shared infrastructure used by the `auth` and `api` crates: the PostgreSQL
//! connection pool, the Redis key/value client backing server-side sessions,
//! and the persistence error type.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     println!("Database health check: {}", health_check(&pool).await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
