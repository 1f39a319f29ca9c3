//! Authentication building blocks for the Disc service
//!
//! - [`password`]: salted Argon2 hashing and constant-time verification
//! - [`session`]: server-side sessions behind an opaque cookie
//! - [`oauth`]: the Spotify identity provider

pub mod oauth;
pub mod password;
pub mod session;

pub use oauth::{
    AuthorizationRequest, IdentityProvider, OAuthFlow, PendingAuthorization, ProviderProfile,
    SpotifyClient, SpotifyConfig, TokenSet,
};
pub use session::{
    MemorySessionStore, RedisSessionStore, Session, SessionConfig, SessionData, SessionManager,
    SessionStore,
};
