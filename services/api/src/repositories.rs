//! Repositories for database operations
//!
//! Each repository is a trait so handlers can be driven against in-memory
//! implementations; the `Pg*` types in the submodules are the PostgreSQL
//! implementations used by the server.

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::{
    Album, AlbumQuery, Artist, Event, NewAlbum, NewArtist, NewEvent, NewOAuthProvider, NewReview,
    NewUser, OAuthProvider, Review, TokenUpdate, User,
};

pub mod album;
pub mod artist;
pub mod event;
pub mod oauth_provider;
pub mod review;
pub mod user;

pub use album::PgAlbumRepository;
pub use artist::PgArtistRepository;
pub use event::PgEventRepository;
pub use oauth_provider::PgOAuthProviderRepository;
pub use review::PgReviewRepository;
pub use user::PgUserRepository;

/// User accounts. `create` fails with `DatabaseError::Conflict` on a taken
/// username.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;
    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;
    async fn list(&self) -> DatabaseResult<Vec<User>>;
    /// Returns the updated user, or `None` when it does not exist
    async fn set_admin(&self, id: i32, is_admin: bool) -> DatabaseResult<Option<User>>;
    /// Removes the user and, by cascade, their provider links
    async fn delete(&self, id: i32) -> DatabaseResult<bool>;
}

/// Third-party identity links, unique per (provider, provider id) and per
/// (user, provider)
#[async_trait]
pub trait OAuthProviderRepository: Send + Sync + 'static {
    async fn create(&self, link: &NewOAuthProvider) -> DatabaseResult<OAuthProvider>;
    async fn find_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> DatabaseResult<Option<OAuthProvider>>;
    async fn find_by_user(
        &self,
        user_id: i32,
        provider: &str,
    ) -> DatabaseResult<Option<OAuthProvider>>;
    async fn update_tokens(&self, id: i32, tokens: &TokenUpdate) -> DatabaseResult<()>;
    /// Replace identity, tokens and profile of an existing link
    async fn relink(&self, id: i32, link: &NewOAuthProvider) -> DatabaseResult<OAuthProvider>;
}

#[async_trait]
pub trait ArtistRepository: Send + Sync + 'static {
    async fn create(&self, artist: &NewArtist) -> DatabaseResult<Artist>;
    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<Artist>>;
    /// All artists by name
    async fn list(&self) -> DatabaseResult<Vec<Artist>>;
    async fn delete(&self, id: i32) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait AlbumRepository: Send + Sync + 'static {
    async fn create(&self, album: &NewAlbum) -> DatabaseResult<Album>;
    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<Album>>;
    /// Albums by title, filtered by artist and/or title substring
    async fn list(&self, query: &AlbumQuery) -> DatabaseResult<Vec<Album>>;
    async fn delete(&self, id: i32) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync + 'static {
    async fn create(&self, review: &NewReview) -> DatabaseResult<Review>;
    /// All reviews, newest first
    async fn list(&self) -> DatabaseResult<Vec<Review>>;
}

#[async_trait]
pub trait EventRepository: Send + Sync + 'static {
    async fn create(&self, event: &NewEvent) -> DatabaseResult<Event>;
    /// All events by date
    async fn list(&self) -> DatabaseResult<Vec<Event>>;
    async fn list_by_location(&self, location: &str) -> DatabaseResult<Vec<Event>>;
    async fn delete(&self, id: i32) -> DatabaseResult<bool>;
}
