//! Accounts backed by a third-party identity
//!
//! Sign-in creates or finds the local user for a provider identity, linking
//! attaches an identity to an existing user, and [`access_token_for`] hands
//! out a usable provider access token, refreshing it first when it expired.

use auth::{ProviderProfile, TokenSet};
use chrono::Utc;
use common::error::DatabaseResult;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{NewOAuthProvider, NewUser, OAuthProvider, TokenUpdate, User},
    repositories::UserRepository,
    state::AppState,
};

/// Attempts at finding a free username before giving up
const USERNAME_ATTEMPTS: usize = 3;

/// Result of attaching a provider identity to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// The identity belongs to another local user
    AlreadyLinkedElsewhere,
}

/// `{preferred}_` plus the first 8 hex chars of a random UUID
fn suffixed_username(preferred: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", preferred, &suffix[..8])
}

/// Create a user named `preferred`, or a suffixed variant when it is taken
async fn create_with_free_username(
    users: &dyn UserRepository,
    preferred: &str,
    template: NewUser,
) -> DatabaseResult<User> {
    let mut username = match users.find_by_username(preferred).await? {
        Some(_) => suffixed_username(preferred),
        None => preferred.to_string(),
    };

    let mut attempt = 1;
    loop {
        let new_user = NewUser {
            username: username.clone(),
            ..template.clone()
        };

        match users.create(&new_user).await {
            Err(e) if e.is_conflict() && attempt < USERNAME_ATTEMPTS => {
                warn!("Username {} taken, retrying", username);
                username = suffixed_username(preferred);
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn new_link(
    user_id: i32,
    provider: &str,
    profile: &ProviderProfile,
    tokens: &TokenSet,
) -> NewOAuthProvider {
    NewOAuthProvider {
        user_id,
        provider: provider.to_string(),
        provider_id: profile.id.clone(),
        access_token: Some(tokens.access_token.clone()),
        refresh_token: tokens.refresh_token.clone(),
        token_expires_at: Some(tokens.expires_at(Utc::now())),
        profile_data: Some(profile.raw.clone()),
    }
}

/// Local user for a provider identity. A known identity gets its tokens
/// refreshed; an unknown one gets a new user and a new link.
pub async fn sign_in_with_provider(
    state: &AppState,
    profile: &ProviderProfile,
    tokens: &TokenSet,
) -> ApiResult<User> {
    let provider = state.identity_provider.name();

    if let Some(link) = state
        .oauth_repository
        .find_by_provider_id(provider, &profile.id)
        .await?
    {
        return sign_in_linked(state, &link, tokens).await;
    }

    let preferred = profile.preferred_username(provider);
    let template = NewUser {
        username: preferred.clone(),
        password_hash: None,
        email: profile.email.clone(),
        profile_image: profile.image_url.clone(),
        location: None,
    };
    let user =
        create_with_free_username(state.user_repository.as_ref(), &preferred, template).await?;

    match state
        .oauth_repository
        .create(&new_link(user.id, provider, profile, tokens))
        .await
    {
        Ok(_) => {
            info!("Created user {} from {} identity", user.username, provider);
            Ok(user)
        }
        Err(e) if e.is_conflict() => {
            // A concurrent callback linked the identity first
            warn!(
                "{} identity {} was linked concurrently, dropping user {}",
                provider, profile.id, user.id
            );
            state.user_repository.delete(user.id).await?;

            let link = state
                .oauth_repository
                .find_by_provider_id(provider, &profile.id)
                .await?
                .ok_or(ApiError::Database(e))?;
            sign_in_linked(state, &link, tokens).await
        }
        Err(e) => {
            state.user_repository.delete(user.id).await?;
            Err(e.into())
        }
    }
}

/// Refresh the stored tokens of a known identity and return its user
async fn sign_in_linked(
    state: &AppState,
    link: &OAuthProvider,
    tokens: &TokenSet,
) -> ApiResult<User> {
    let user = state
        .user_repository
        .find_by_id(link.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let update = TokenUpdate::from_tokens(tokens, link.refresh_token.as_deref(), Utc::now());
    state.oauth_repository.update_tokens(link.id, &update).await?;

    info!("User {} signed in with {}", user.id, link.provider);
    Ok(user)
}

/// Attach a provider identity to `user_id`. An existing link of that user is
/// replaced by the new identity.
pub async fn link_provider(
    state: &AppState,
    user_id: i32,
    profile: &ProviderProfile,
    tokens: &TokenSet,
) -> ApiResult<LinkOutcome> {
    let provider = state.identity_provider.name();

    if state.user_repository.find_by_id(user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    if let Some(existing) = state
        .oauth_repository
        .find_by_provider_id(provider, &profile.id)
        .await?
    {
        if existing.user_id != user_id {
            warn!(
                "{} identity {} is already linked to user {}",
                provider, profile.id, existing.user_id
            );
            return Ok(LinkOutcome::AlreadyLinkedElsewhere);
        }

        let update =
            TokenUpdate::from_tokens(tokens, existing.refresh_token.as_deref(), Utc::now());
        state
            .oauth_repository
            .update_tokens(existing.id, &update)
            .await?;
        return Ok(LinkOutcome::Linked);
    }

    let link = new_link(user_id, provider, profile, tokens);
    match state
        .oauth_repository
        .find_by_user(user_id, provider)
        .await?
    {
        Some(current) => {
            info!("Replacing {} link of user {}", provider, user_id);
            state.oauth_repository.relink(current.id, &link).await?;
        }
        None => {
            state.oauth_repository.create(&link).await?;
        }
    }

    info!("Linked {} identity to user {}", provider, user_id);
    Ok(LinkOutcome::Linked)
}

/// A provider access token for `user_id` that is valid now
pub async fn access_token_for(state: &AppState, user_id: i32) -> ApiResult<String> {
    let provider = state.identity_provider.name();
    let link = state
        .oauth_repository
        .find_by_user(user_id, provider)
        .await?
        .ok_or_else(|| ApiError::NotFound("No Spotify account connected".to_string()))?;

    let now = Utc::now();
    if let Some(token) = link.usable_access_token(now) {
        return Ok(token.to_string());
    }

    let Some(refresh_token) = link.refresh_token.as_deref() else {
        warn!("User {} has an expired {} token and no refresh token", user_id, provider);
        return Err(ApiError::ReauthorizationRequired);
    };

    let tokens = state
        .identity_provider
        .refresh_access_token(refresh_token)
        .await
        .map_err(ApiError::Upstream)?;

    let update = TokenUpdate::from_tokens(&tokens, Some(refresh_token), now);
    state.oauth_repository.update_tokens(link.id, &update).await?;

    info!("Refreshed {} token for user {}", provider, user_id);
    Ok(update.access_token)
}
