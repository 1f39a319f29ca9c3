//! OAuth2 integration with the Spotify accounts service
//!
//! [`IdentityProvider`] is the seam the HTTP layer talks to: build an
//! authorization URL, exchange a callback code, refresh an access token and
//! read the user's profile. [`SpotifyClient`] implements it with the `oauth2`
//! crate (authorization code flow with PKCE) and `reqwest` for the Web API.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenResponse},
    reqwest::async_http_client,
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, time::Duration};
use tracing::info;

pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Scopes requested for both login and account linking
pub const SPOTIFY_SCOPES: [&str; 5] = [
    "user-read-email",
    "user-read-private",
    "user-top-read",
    "user-read-recently-played",
    "user-library-read",
];

/// Assumed access token lifetime when the provider omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Why the user was sent to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OAuthFlow {
    /// Sign in (or sign up) with the provider identity
    Login,
    /// Attach the provider identity to the logged-in account
    Link,
}

/// Round-trip state kept in the session between redirect and callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub csrf_state: String,
    pub pkce_verifier: String,
    pub flow: OAuthFlow,
}

impl PendingAuthorization {
    /// Whether a callback's `state` parameter belongs to this round-trip
    pub fn matches(&self, state: &str, flow: OAuthFlow) -> bool {
        self.flow == flow && self.csrf_state == state
    }
}

/// Where to send the browser, plus what to remember until it comes back
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub pending: PendingAuthorization,
}

/// Tokens returned by a code exchange or a refresh
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<Duration>,
}

impl TokenSet {
    /// Absolute expiry of the access token, counted from `now`
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let lifetime = chrono::Duration::from_std(lifetime)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME.as_secs() as i64));
        now + lifetime
    }
}

impl From<&BasicTokenResponse> for TokenSet {
    fn from(token: &BasicTokenResponse) -> Self {
        Self {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            expires_in: token.expires_in(),
        }
    }
}

/// Identity reported by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    /// Provider response as received
    pub raw: serde_json::Value,
}

impl ProviderProfile {
    /// Username to try for a new account: the display name, or
    /// `{provider}_{id}` when there is none
    pub fn preferred_username(&self, provider: &str) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}_{}", provider, self.id),
        }
    }
}

/// Third-party identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Provider name stored on link rows, e.g. `"spotify"`
    fn name(&self) -> &'static str;

    /// Build the authorization redirect for `flow`
    fn authorization_request(&self, flow: OAuthFlow) -> Result<AuthorizationRequest>;

    /// Exchange a callback code for tokens
    async fn exchange_code(
        &self,
        flow: OAuthFlow,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<TokenSet>;

    /// Exchange a refresh token for a new access token
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet>;

    /// Read the profile of the token's owner
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile>;

    /// The token owner's most played tracks, as returned by the provider
    async fn top_tracks(&self, access_token: &str) -> Result<serde_json::Value>;
}

/// Spotify application credentials and endpoints
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback for [`OAuthFlow::Login`]
    pub login_redirect_url: String,
    /// Callback for [`OAuthFlow::Link`]
    pub link_redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl SpotifyConfig {
    /// Configuration against the public Spotify endpoints
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        login_redirect_url: impl Into<String>,
        link_redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            login_redirect_url: login_redirect_url.into(),
            link_redirect_url: link_redirect_url.into(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            api_base_url: SPOTIFY_API_BASE_URL.to_string(),
        }
    }
}

/// Spotify OAuth2 + Web API client
#[derive(Clone)]
pub struct SpotifyClient {
    client: BasicClient,
    login_redirect: RedirectUrl,
    link_redirect: RedirectUrl,
    api_base_url: String,
    http: reqwest::Client,
}

impl SpotifyClient {
    /// Create a new Spotify client
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(config.client_id),
            Some(ClientSecret::new(config.client_secret)),
            AuthUrl::new(config.auth_url)?,
            Some(TokenUrl::new(config.token_url)?),
        );

        Ok(Self {
            client,
            login_redirect: RedirectUrl::new(config.login_redirect_url)?,
            link_redirect: RedirectUrl::new(config.link_redirect_url)?,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        })
    }

    fn redirect_url(&self, flow: OAuthFlow) -> &RedirectUrl {
        match flow {
            OAuthFlow::Login => &self.login_redirect,
            OAuthFlow::Link => &self.link_redirect,
        }
    }

    async fn get_json(&self, access_token: &str, path: &str) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(format!("{}{}", self.api_base_url, path))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Spotify request to {} failed: {}",
                path,
                response.status()
            ));
        }

        Ok(response.json().await?)
    }
}

/// Spotify `/me` response
#[derive(Debug, Deserialize)]
struct SpotifyUser {
    id: String,
    display_name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

impl SpotifyUser {
    fn into_profile(self, raw: serde_json::Value) -> ProviderProfile {
        ProviderProfile {
            id: self.id,
            display_name: self.display_name,
            email: self.email,
            image_url: self.images.into_iter().next().map(|image| image.url),
            raw,
        }
    }
}

#[async_trait]
impl IdentityProvider for SpotifyClient {
    fn name(&self) -> &'static str {
        "spotify"
    }

    fn authorization_request(&self, flow: OAuthFlow) -> Result<AuthorizationRequest> {
        info!("Generating authorization URL for {:?}", flow);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .set_redirect_uri(Cow::Borrowed(self.redirect_url(flow)));

        for scope in SPOTIFY_SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token) = request.url();

        Ok(AuthorizationRequest {
            url: auth_url.to_string(),
            pending: PendingAuthorization {
                csrf_state: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
                flow,
            },
        })
    }

    async fn exchange_code(
        &self,
        flow: OAuthFlow,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<TokenSet> {
        info!("Exchanging authorization code for access token ({:?})", flow);

        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .set_redirect_uri(Cow::Borrowed(self.redirect_url(flow)))
            .request_async(async_http_client)
            .await
            .map_err(|e| anyhow::anyhow!("Spotify code exchange failed: {}", e))?;

        Ok(TokenSet::from(&token_response))
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet> {
        info!("Refreshing Spotify access token");

        let token_response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| anyhow::anyhow!("Spotify token refresh failed: {}", e))?;

        Ok(TokenSet::from(&token_response))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile> {
        let raw = self.get_json(access_token, "/me").await?;
        let user: SpotifyUser = serde_json::from_value(raw.clone())?;
        Ok(user.into_profile(raw))
    }

    async fn top_tracks(&self, access_token: &str) -> Result<serde_json::Value> {
        self.get_json(access_token, "/me/top/tracks?limit=20&time_range=medium_term")
            .await
    }
}
