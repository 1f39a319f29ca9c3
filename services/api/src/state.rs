//! Application state shared across handlers

use auth::{IdentityProvider, SessionManager};
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    recommendations::RecommendationEngine,
    repositories::{
        AlbumRepository, ArtistRepository, EventRepository, OAuthProviderRepository,
        PgAlbumRepository, PgArtistRepository, PgEventRepository, PgOAuthProviderRepository,
        PgReviewRepository, PgUserRepository, ReviewRepository, UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub oauth_repository: Arc<dyn OAuthProviderRepository>,
    pub artist_repository: Arc<dyn ArtistRepository>,
    pub album_repository: Arc<dyn AlbumRepository>,
    pub review_repository: Arc<dyn ReviewRepository>,
    pub event_repository: Arc<dyn EventRepository>,
    pub session_manager: SessionManager,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub recommendation_engine: Arc<dyn RecommendationEngine>,
}

impl AppState {
    /// State with every repository backed by `pool`
    pub fn with_postgres(
        pool: PgPool,
        session_manager: SessionManager,
        identity_provider: Arc<dyn IdentityProvider>,
        recommendation_engine: Arc<dyn RecommendationEngine>,
    ) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            oauth_repository: Arc::new(PgOAuthProviderRepository::new(pool.clone())),
            artist_repository: Arc::new(PgArtistRepository::new(pool.clone())),
            album_repository: Arc::new(PgAlbumRepository::new(pool.clone())),
            review_repository: Arc::new(PgReviewRepository::new(pool.clone())),
            event_repository: Arc::new(PgEventRepository::new(pool)),
            session_manager,
            identity_provider,
            recommendation_engine,
        }
    }
}
