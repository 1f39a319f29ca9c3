//! Service settings
//!
//! Layered with the `config` crate: built-in defaults, an optional `disc.toml`
//! in the working directory, then environment variables (`BIND_ADDRESS`,
//! `SPOTIFY_CLIENT_ID`, ...).

use auth::{SessionConfig, SpotifyConfig};
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::recommendations::OpenAiConfig;

/// Where sessions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    pub session_backend: SessionBackend,
    pub session_ttl_seconds: u64,
    pub cookie_secure: bool,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_callback_url: String,
    pub spotify_link_callback_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
}

impl Settings {
    /// Load settings from defaults, `disc.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name("disc").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:5000")?
            .set_default("session_backend", "redis")?
            .set_default("session_ttl_seconds", 86_400_i64)?
            .set_default("cookie_secure", false)?
            .set_default("spotify_client_id", "")?
            .set_default("spotify_client_secret", "")?
            .set_default(
                "spotify_callback_url",
                "http://localhost:5000/api/auth/spotify/callback",
            )?
            .set_default(
                "spotify_link_callback_url",
                "http://localhost:5000/api/link/spotify/callback",
            )?
            .set_default("openai_api_key", "")?
            .set_default("openai_model", "gpt-4o")?
            .set_default("openai_base_url", "https://api.openai.com/v1")
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl_seconds: self.session_ttl_seconds,
            cookie_secure: self.cookie_secure,
        }
    }

    pub fn spotify_config(&self) -> SpotifyConfig {
        SpotifyConfig::new(
            self.spotify_client_id.clone(),
            self.spotify_client_secret.clone(),
            self.spotify_callback_url.clone(),
            self.spotify_link_callback_url.clone(),
        )
    }

    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            base_url: self.openai_base_url.clone(),
        }
    }
}
