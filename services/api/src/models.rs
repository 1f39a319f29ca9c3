//! API models for stored entities and request payloads
//!
//! Everything crosses the wire in camelCase to match the web client.

pub mod album;
pub mod artist;
pub mod event;
pub mod oauth_provider;
pub mod review;
pub mod user;

pub use album::{Album, AlbumQuery, NewAlbum};
pub use artist::{Artist, NewArtist};
pub use event::{Event, NewEvent};
pub use oauth_provider::{NewOAuthProvider, OAuthProvider, TokenUpdate};
pub use review::{CreateReviewRequest, NewReview, Review};
pub use user::{LoginRequest, NewUser, RegisterRequest, UpdateUserRequest, User};
