//! Server-side sessions referenced by an opaque cookie
//!
//! The browser only ever holds a random session id in the `disc.sid` cookie.
//! Everything else (who is logged in, an account-linking target, the PKCE
//! verifier of an OAuth round-trip) lives in a [`SessionStore`] keyed by
//! `session:{id}`. Handlers load a [`Session`], mutate its data and hand it
//! back to the [`SessionManager`] together with the request's cookie jar.

use anyhow::Result;
use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::cache::RedisPool;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::oauth::PendingAuthorization;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE_NAME: &str = "disc.sid";

/// Lifetime of a "remember me" session: 30 days
pub const REMEMBER_ME_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server-side lifetime of a session that is not remembered
    pub ttl_seconds: u64,
    /// Mark the cookie `Secure` (HTTPS deployments)
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 24 * 60 * 60,
            cookie_secure: false,
        }
    }
}

/// State persisted for one session id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Logged-in user, if any
    pub user_id: Option<i32>,
    /// Local account a third-party identity is being attached to
    pub link_user_id: Option<i32>,
    /// OAuth round-trip in flight
    pub pending_oauth: Option<PendingAuthorization>,
    /// Session was created with "remember me"
    pub remember: bool,
}

/// A session restored from (or about to be written to) the store
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    pub data: SessionData,
    persisted: bool,
}

impl Session {
    fn fresh() -> Self {
        Self {
            id: generate_session_id(),
            data: SessionData::default(),
            persisted: false,
        }
    }

    /// Session id as stored in the cookie
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Logged-in user id
    pub fn user_id(&self) -> Option<i32> {
        self.data.user_id
    }

    /// Whether the session exists server-side
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }
}

/// Backend holding session data
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, id: &str) -> Result<Option<SessionData>>;
    async fn set(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;
}

fn session_key(id: &str) -> String {
    format!("session:{}", id)
}

/// Sessions stored in Redis with a TTL per key
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, id: &str) -> Result<Option<SessionData>> {
        self.redis_pool.get_json(&session_key(id)).await
    }

    async fn set(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> Result<()> {
        self.redis_pool
            .set_json(&session_key(id), data, Some(ttl_seconds))
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.redis_pool.delete(&session_key(id)).await
    }
}

#[derive(Debug)]
struct MemoryEntry {
    data: SessionData,
    expires: Instant,
}

/// Process-local session store for development and tests. Sessions do not
/// survive a restart and are not shared between instances.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|entry| entry.expires > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<SessionData>> {
        let mut entries = self.entries.lock().await;
        let key = session_key(id);

        match entries.get(&key) {
            Some(entry) if entry.expires > Instant::now() => Ok(Some(entry.data.clone())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        // Abandoned sessions are never read again, so expiry is swept on write
        entries.retain(|_, entry| entry.expires > now);
        entries.insert(
            session_key(id),
            MemoryEntry {
                data: data.clone(),
                expires: now + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(&session_key(id));
        Ok(())
    }
}

/// Loads, saves and rotates sessions and keeps the cookie in step
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Restore the session named by the request cookie. A missing, unknown
    /// or expired id yields a fresh, unsaved session.
    pub async fn load(&self, jar: &CookieJar) -> Result<Session> {
        let Some(cookie) = jar.get(SESSION_COOKIE_NAME) else {
            return Ok(Session::fresh());
        };

        let id = cookie.value().to_string();
        match self.store.get(&id).await? {
            Some(data) => Ok(Session {
                id,
                data,
                persisted: true,
            }),
            None => Ok(Session::fresh()),
        }
    }

    /// Persist the session and (re)issue its cookie
    pub async fn save(&self, jar: CookieJar, session: &mut Session) -> Result<CookieJar> {
        let ttl = self.ttl_for(&session.data);
        self.store.set(&session.id, &session.data, ttl).await?;
        session.persisted = true;

        Ok(jar.add(self.cookie(session.id.clone(), session.data.remember)))
    }

    /// Log `user_id` in. The session id is rotated and any state from the
    /// anonymous session is dropped.
    pub async fn login(
        &self,
        jar: CookieJar,
        previous: Session,
        user_id: i32,
        remember: bool,
    ) -> Result<(CookieJar, Session)> {
        if previous.persisted {
            self.store.delete(&previous.id).await?;
        }

        let mut session = Session::fresh();
        session.data.user_id = Some(user_id);
        session.data.remember = remember;

        info!("Creating session for user: {}", user_id);
        let jar = self.save(jar, &mut session).await?;
        Ok((jar, session))
    }

    /// Drop the session server-side and clear the cookie
    pub async fn destroy(&self, jar: CookieJar, session: &Session) -> Result<CookieJar> {
        if session.persisted {
            if let Some(user_id) = session.data.user_id {
                info!("Deleting session for user: {}", user_id);
            }
            self.store.delete(&session.id).await?;
        } else {
            warn!("Destroy requested for a session that was never saved");
        }

        Ok(jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/")))
    }

    fn ttl_for(&self, data: &SessionData) -> u64 {
        if data.remember {
            REMEMBER_ME_SECONDS
        } else {
            self.config.ttl_seconds
        }
    }

    fn cookie(&self, id: String, remember: bool) -> Cookie<'static> {
        let builder = Cookie::build((SESSION_COOKIE_NAME, id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.cookie_secure);

        if remember {
            builder
                .max_age(time::Duration::seconds(REMEMBER_ME_SECONDS as i64))
                .build()
        } else {
            builder.build()
        }
    }
}

fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
