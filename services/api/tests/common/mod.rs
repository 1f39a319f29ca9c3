//! Shared fixtures: the real router over in-memory repositories, sessions,
//! identity provider and recommendation engine.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use auth::{
    AuthorizationRequest, IdentityProvider, MemorySessionStore, OAuthFlow, PendingAuthorization,
    ProviderProfile, SessionConfig, SessionManager, TokenSet,
};
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use common::error::{DatabaseError, DatabaseResult};
use disc_api::{
    AppState, create_router,
    models::{
        Album, AlbumQuery, Artist, Event, NewAlbum, NewArtist, NewEvent, NewOAuthProvider,
        NewReview, NewUser, OAuthProvider, Review, TokenUpdate, User,
    },
    recommendations::{RecommendationEngine, Sentiment},
    repositories::{
        AlbumRepository, ArtistRepository, EventRepository, OAuthProviderRepository,
        ReviewRepository, UserRepository,
    },
};
use serde_json::{Value, json};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tower::util::ServiceExt;

pub const SESSION_COOKIE: &str = "disc.sid";

// =============================================================================
// In-memory persistence
// =============================================================================

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: Vec<User>,
    links: Vec<OAuthProvider>,
    artists: Vec<Artist>,
    albums: Vec<Album>,
    reviews: Vec<Review>,
    events: Vec<Event>,
    /// (username, provider id) created by a competing callback right after
    /// the next user insert
    competing_sign_in: Option<(String, String)>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// All repositories over one set of in-memory tables, with the same
/// uniqueness rules as the PostgreSQL schema
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    pub fn all_users(&self) -> Vec<User> {
        self.tables.lock().unwrap().users.clone()
    }

    pub fn all_links(&self) -> Vec<OAuthProvider> {
        self.tables.lock().unwrap().links.clone()
    }

    pub fn user_named(&self, username: &str) -> Option<User> {
        self.all_users()
            .into_iter()
            .find(|user| user.username == username)
    }

    pub fn make_admin(&self, user_id: i32) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|user| user.id == user_id) {
            user.is_admin = true;
        }
    }

    /// Let a competing first sign-in for `provider_id` win right after the
    /// next user is created
    pub fn race_next_sign_in(&self, username: &str, provider_id: &str) {
        self.tables.lock().unwrap().competing_sign_in =
            Some((username.to_string(), provider_id.to_string()));
    }

    /// Insert a provider link directly
    pub fn insert_link(
        &self,
        user_id: i32,
        provider_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_in: Duration,
    ) -> OAuthProvider {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let link = OAuthProvider {
            id: tables.next_id(),
            user_id,
            provider: "spotify".to_string(),
            provider_id: provider_id.to_string(),
            access_token: Some(access_token.to_string()),
            refresh_token: refresh_token.map(str::to_string),
            token_expires_at: Some(now + expires_in),
            profile_data: None,
            created_at: now,
            updated_at: now,
        };
        tables.links.push(link.clone());
        link
    }
}

fn conflict(constraint: &str) -> DatabaseError {
    DatabaseError::Conflict(constraint.to_string())
}

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(conflict("users_username_key"));
        }

        let user = User {
            id: tables.next_id(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            email: new_user.email.clone(),
            profile_image: new_user.profile_image.clone(),
            location: new_user.location.clone(),
            is_admin: false,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        if let Some((username, provider_id)) = tables.competing_sign_in.take() {
            let now = Utc::now();
            let winner = User {
                id: tables.next_id(),
                username,
                created_at: now,
                ..user.clone()
            };
            let link = OAuthProvider {
                id: tables.next_id(),
                user_id: winner.id,
                provider: "spotify".to_string(),
                provider_id,
                access_token: Some("winner-access".to_string()),
                refresh_token: Some("winner-refresh".to_string()),
                token_expires_at: Some(now + Duration::hours(1)),
                profile_data: None,
                created_at: now,
                updated_at: now,
            };
            tables.users.push(winner);
            tables.links.push(link);
        }

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> DatabaseResult<Vec<User>> {
        let tables = self.tables.lock().unwrap();
        let mut users = tables.users.clone();
        users.reverse();
        Ok(users)
    }

    async fn set_admin(&self, id: i32, is_admin: bool) -> DatabaseResult<Option<User>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.is_admin = is_admin;
            user.clone()
        }))
    }

    async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        tables.links.retain(|l| l.user_id != id);
        Ok(tables.users.len() < before)
    }
}

#[async_trait]
impl OAuthProviderRepository for MemoryDatabase {
    async fn create(&self, link: &NewOAuthProvider) -> DatabaseResult<OAuthProvider> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .links
            .iter()
            .any(|l| l.provider == link.provider && l.provider_id == link.provider_id)
        {
            return Err(conflict("oauth_providers_provider_identity_key"));
        }
        if tables
            .links
            .iter()
            .any(|l| l.user_id == link.user_id && l.provider == link.provider)
        {
            return Err(conflict("oauth_providers_user_provider_key"));
        }

        let now = Utc::now();
        let stored = OAuthProvider {
            id: tables.next_id(),
            user_id: link.user_id,
            provider: link.provider.clone(),
            provider_id: link.provider_id.clone(),
            access_token: link.access_token.clone(),
            refresh_token: link.refresh_token.clone(),
            token_expires_at: link.token_expires_at,
            profile_data: link.profile_data.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.links.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> DatabaseResult<Option<OAuthProvider>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .links
            .iter()
            .find(|l| l.provider == provider && l.provider_id == provider_id)
            .cloned())
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        provider: &str,
    ) -> DatabaseResult<Option<OAuthProvider>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .links
            .iter()
            .find(|l| l.user_id == user_id && l.provider == provider)
            .cloned())
    }

    async fn update_tokens(&self, id: i32, tokens: &TokenUpdate) -> DatabaseResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(link) = tables.links.iter_mut().find(|l| l.id == id) {
            link.access_token = Some(tokens.access_token.clone());
            link.refresh_token = tokens.refresh_token.clone();
            link.token_expires_at = Some(tokens.token_expires_at);
            link.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn relink(&self, id: i32, link: &NewOAuthProvider) -> DatabaseResult<OAuthProvider> {
        let mut tables = self.tables.lock().unwrap();
        if tables.links.iter().any(|l| {
            l.id != id && l.provider == link.provider && l.provider_id == link.provider_id
        }) {
            return Err(conflict("oauth_providers_provider_identity_key"));
        }

        let stored = tables
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| DatabaseError::Query(sqlx::Error::RowNotFound))?;
        stored.provider_id = link.provider_id.clone();
        stored.access_token = link.access_token.clone();
        stored.refresh_token = link.refresh_token.clone();
        stored.token_expires_at = link.token_expires_at;
        stored.profile_data = link.profile_data.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl ArtistRepository for MemoryDatabase {
    async fn create(&self, artist: &NewArtist) -> DatabaseResult<Artist> {
        let mut tables = self.tables.lock().unwrap();
        let stored = Artist {
            id: tables.next_id(),
            name: artist.name.trim().to_string(),
            genres: artist.genres.clone(),
            image_url: artist.image_url.clone(),
            created_at: Utc::now(),
        };
        tables.artists.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<Artist>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.artists.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self) -> DatabaseResult<Vec<Artist>> {
        let tables = self.tables.lock().unwrap();
        let mut artists = tables.artists.clone();
        artists.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(artists)
    }

    async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.artists.len();
        tables.artists.retain(|a| a.id != id);
        let deleted = tables.artists.len() < before;
        if deleted {
            tables.albums.retain(|album| album.artist_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl AlbumRepository for MemoryDatabase {
    async fn create(&self, album: &NewAlbum) -> DatabaseResult<Album> {
        let mut tables = self.tables.lock().unwrap();
        let stored = Album {
            id: tables.next_id(),
            title: album.title.trim().to_string(),
            artist_id: album.artist_id,
            cover_url: album.cover_url.clone(),
            release_date: album.release_date,
            genres: album.genres.clone(),
            created_at: Utc::now(),
        };
        tables.albums.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<Album>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.albums.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self, query: &AlbumQuery) -> DatabaseResult<Vec<Album>> {
        let tables = self.tables.lock().unwrap();
        let term = query.search_term().map(str::to_lowercase);
        let mut albums: Vec<Album> = tables
            .albums
            .iter()
            .filter(|a| query.artist_id.is_none_or(|artist_id| a.artist_id == artist_id))
            .filter(|a| {
                term.as_deref()
                    .is_none_or(|term| a.title.to_lowercase().contains(term))
            })
            .cloned()
            .collect();
        albums.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(albums)
    }

    async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.albums.len();
        tables.albums.retain(|a| a.id != id);
        Ok(tables.albums.len() < before)
    }
}

#[async_trait]
impl ReviewRepository for MemoryDatabase {
    async fn create(&self, review: &NewReview) -> DatabaseResult<Review> {
        let mut tables = self.tables.lock().unwrap();
        let stored = Review {
            id: tables.next_id(),
            user_id: review.user_id,
            album_id: review.album_id.clone(),
            rating: review.rating,
            review: review.review.clone(),
            created_at: Utc::now(),
        };
        tables.reviews.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> DatabaseResult<Vec<Review>> {
        let tables = self.tables.lock().unwrap();
        let mut reviews = tables.reviews.clone();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }
}

#[async_trait]
impl EventRepository for MemoryDatabase {
    async fn create(&self, event: &NewEvent) -> DatabaseResult<Event> {
        let mut tables = self.tables.lock().unwrap();
        let stored = Event {
            id: tables.next_id(),
            external_id: event.external_id.clone(),
            title: event.title.trim().to_string(),
            venue: event.venue.trim().to_string(),
            date: event.date,
            artist_name: event.artist_name.trim().to_string(),
            location: event.location.trim().to_string(),
            metadata: event.metadata.clone(),
        };
        tables.events.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> DatabaseResult<Vec<Event>> {
        let tables = self.tables.lock().unwrap();
        let mut events = tables.events.clone();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn list_by_location(&self, location: &str) -> DatabaseResult<Vec<Event>> {
        let events = EventRepository::list(self).await?;
        Ok(events
            .into_iter()
            .filter(|event| event.location == location)
            .collect())
    }

    async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        Ok(tables.events.len() < before)
    }
}

// =============================================================================
// Identity provider and recommendation engine
// =============================================================================

/// Provider that accepts any code except `bad-code` and always reports
/// `profile`
pub struct FakeIdentityProvider {
    pub profile: Mutex<ProviderProfile>,
    /// Tokens returned by a refresh; `None` makes refreshing fail
    pub refreshed: Mutex<Option<TokenSet>>,
    pub refresh_calls: AtomicUsize,
    issued: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self {
            profile: Mutex::new(spotify_profile("sp-listener", Some("Listener"))),
            refreshed: Mutex::new(Some(TokenSet {
                access_token: "refreshed-access".to_string(),
                refresh_token: None,
                expires_in: Some(std::time::Duration::from_secs(3600)),
            })),
            refresh_calls: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
        }
    }

    pub fn set_profile(&self, profile: ProviderProfile) {
        *self.profile.lock().unwrap() = profile;
    }
}

pub fn spotify_profile(id: &str, display_name: Option<&str>) -> ProviderProfile {
    ProviderProfile {
        id: id.to_string(),
        display_name: display_name.map(str::to_string),
        email: Some(format!("{}@example.com", id)),
        image_url: Some(format!("https://i.scdn.co/{}.jpg", id)),
        raw: json!({"id": id, "display_name": display_name}),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn name(&self) -> &'static str {
        "spotify"
    }

    fn authorization_request(&self, flow: OAuthFlow) -> Result<AuthorizationRequest> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let state = format!("state-{}", n);
        Ok(AuthorizationRequest {
            url: format!("https://accounts.example/authorize?state={}", state),
            pending: PendingAuthorization {
                csrf_state: state,
                pkce_verifier: format!("verifier-{}", n),
                flow,
            },
        })
    }

    async fn exchange_code(
        &self,
        _flow: OAuthFlow,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<TokenSet> {
        if code == "bad-code" || pkce_verifier.is_empty() {
            return Err(anyhow!("invalid_grant"));
        }
        Ok(TokenSet {
            access_token: format!("access-{}", code),
            refresh_token: Some(format!("refresh-{}", code)),
            expires_in: Some(std::time::Duration::from_secs(3600)),
        })
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<TokenSet> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refreshed
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("invalid_grant"))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile> {
        let mut profile = self.profile.lock().unwrap().clone();
        profile.raw["seen_token"] = json!(access_token);
        Ok(profile)
    }

    async fn top_tracks(&self, access_token: &str) -> Result<Value> {
        Ok(json!({"items": [{"name": "Giant Steps"}], "seen_token": access_token}))
    }
}

/// Engine replying with fixed suggestions and a configurable raw sentiment
pub struct FakeRecommendationEngine {
    pub raw_sentiment: Mutex<(f64, f64)>,
    pub fail: Mutex<bool>,
}

impl FakeRecommendationEngine {
    pub fn new() -> Self {
        Self {
            raw_sentiment: Mutex::new((4.0, 0.9)),
            fail: Mutex::new(false),
        }
    }
}

#[async_trait]
impl RecommendationEngine for FakeRecommendationEngine {
    async fn recommend(&self, liked_albums: &[String], _reviews: &[String]) -> Result<Value> {
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("OpenAI request failed: 500"));
        }
        Ok(json!({
            "recommendations": ["A Love Supreme"],
            "explanation": format!("Because you liked {}", liked_albums.join(", ")),
        }))
    }

    async fn analyze_sentiment(&self, _review: &str) -> Result<Sentiment> {
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("OpenAI request failed: 500"));
        }
        let (rating, confidence) = *self.raw_sentiment.lock().unwrap();
        Sentiment::from_raw(rating, confidence)
    }
}

// =============================================================================
// Test app and HTTP helpers
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub db: MemoryDatabase,
    pub sessions: MemorySessionStore,
    pub provider: Arc<FakeIdentityProvider>,
    pub engine: Arc<FakeRecommendationEngine>,
}

/// Response with its body parsed as JSON (`Null` when empty, a string when
/// not JSON)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Raw `Set-Cookie` header for the session cookie
    pub fn session_set_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{}=", SESSION_COOKIE)))
            .map(str::to_string)
    }

    /// `name=value` pair to send back as a `Cookie` header
    pub fn cookie(&self) -> Option<String> {
        self.session_set_cookie()
            .and_then(|value| value.split(';').next().map(str::to_string))
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }
}

impl TestApp {
    pub fn new() -> Self {
        let db = MemoryDatabase::default();
        let sessions = MemorySessionStore::new();
        let provider = Arc::new(FakeIdentityProvider::new());
        let engine = Arc::new(FakeRecommendationEngine::new());

        let state = AppState {
            user_repository: Arc::new(db.clone()),
            oauth_repository: Arc::new(db.clone()),
            artist_repository: Arc::new(db.clone()),
            album_repository: Arc::new(db.clone()),
            review_repository: Arc::new(db.clone()),
            event_repository: Arc::new(db.clone()),
            session_manager: SessionManager::new(
                Arc::new(sessions.clone()),
                SessionConfig::default(),
            ),
            identity_provider: provider.clone(),
            recommendation_engine: engine.clone(),
        };

        Self {
            router: create_router(state),
            db,
            sessions,
            provider,
            engine,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Register `username` and return its session cookie
    pub async fn register(&self, username: &str, password: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/register",
                json!({"username": username, "password": password}),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.cookie().unwrap()
    }

    /// Register an admin and return its session cookie
    pub async fn admin(&self) -> String {
        let cookie = self.register("admin", "admin-pw").await;
        let admin = self.db.user_named("admin").unwrap();
        self.db.make_admin(admin.id);
        cookie
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    request("GET", uri, cookie, Body::empty())
}

pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut request = request(method, uri, cookie, Body::from(body.to_string()));
    request.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    request
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body).unwrap()
}

/// `state` query parameter of a provider redirect
pub fn state_param(location: &str) -> String {
    location
        .split("state=")
        .nth(1)
        .map(|rest| rest.split('&').next().unwrap_or(rest).to_string())
        .unwrap()
}
