use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use auth::{
    MemorySessionStore, RedisSessionStore, SessionManager, SessionStore, SpotifyClient,
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
    error::DatabaseError,
};
use disc_api::{
    AppState, create_router,
    recommendations::OpenAiClient,
    settings::{SessionBackend, Settings},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Disc API service");

    let settings = Settings::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    info!("Database migrations applied");

    let session_store: Arc<dyn SessionStore> = match settings.session_backend {
        SessionBackend::Redis => {
            let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;
            if !redis_pool.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }
            info!("Redis connection successful");
            Arc::new(RedisSessionStore::new(redis_pool))
        }
        SessionBackend::Memory => {
            warn!("Using in-memory sessions; they are lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };
    let session_manager = SessionManager::new(session_store, settings.session_config());

    if settings.spotify_client_id.is_empty() {
        warn!("SPOTIFY_CLIENT_ID is not set; Spotify sign-in will fail");
    }
    if settings.openai_api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; recommendations will fail");
    }

    let identity_provider = Arc::new(SpotifyClient::new(settings.spotify_config())?);
    let recommendation_engine = Arc::new(OpenAiClient::new(settings.openai_config()));

    let app_state = AppState::with_postgres(
        pool,
        session_manager,
        identity_provider,
        recommendation_engine,
    );

    // Start the web server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("Disc API listening on {}", settings.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Disc API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
