//! Spotify sign-in, account linking and Web API passthrough

use auth::{OAuthFlow, PendingAuthorization, Session, TokenSet};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult, LINK_LOGIN_REQUIRED},
    middleware::{CurrentUser, resolve_user},
    oauth::{self, LinkOutcome},
    state::AppState,
};

const LOGIN_SUCCESS_REDIRECT: &str = "/";
const LOGIN_FAILURE_REDIRECT: &str = "/auth?error=spotify-auth-failed";
const LINK_SUCCESS_REDIRECT: &str = "/account?success=spotify-linked";
const LINK_FAILURE_REDIRECT: &str = "/account?error=spotify-link-failed";
const LINK_NO_USER_REDIRECT: &str = "/account?error=spotify-link-failed-no-user";
const LINK_TAKEN_REDIRECT: &str = "/account?error=spotify-already-linked";

/// Query string of a provider callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackQuery {
    /// Code of a callback belonging to `pending`
    fn verified_code(
        self,
        pending: Option<&PendingAuthorization>,
        flow: OAuthFlow,
    ) -> ApiResult<String> {
        if let Some(error) = self.error {
            return Err(ApiError::BadRequest(format!(
                "Provider returned error: {}",
                error
            )));
        }

        let pending = pending
            .ok_or_else(|| ApiError::BadRequest("No authorization in progress".to_string()))?;

        match (self.code, self.state) {
            (Some(code), Some(state)) if pending.matches(&state, flow) => Ok(code),
            (Some(_), Some(_)) => Err(ApiError::BadRequest("OAuth state mismatch".to_string())),
            _ => Err(ApiError::BadRequest("Missing code or state".to_string())),
        }
    }
}

/// Redirect to the provider to sign in
pub async fn begin_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let mut session = state
        .session_manager
        .load(&jar)
        .await
        .map_err(ApiError::Session)?;

    let request = state
        .identity_provider
        .authorization_request(OAuthFlow::Login)?;
    session.data.pending_oauth = Some(request.pending);

    let jar = state
        .session_manager
        .save(jar, &mut session)
        .await
        .map_err(ApiError::Session)?;

    Ok((jar, Redirect::to(&request.url)))
}

/// Redirect to the provider to attach it to the logged-in account
pub async fn begin_link(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let mut session = state
        .session_manager
        .load(&jar)
        .await
        .map_err(ApiError::Session)?;

    let user = resolve_user(&state, &session)
        .await?
        .ok_or(ApiError::Unauthenticated(LINK_LOGIN_REQUIRED))?;

    let request = state
        .identity_provider
        .authorization_request(OAuthFlow::Link)?;
    session.data.link_user_id = Some(user.id);
    session.data.pending_oauth = Some(request.pending);

    let jar = state
        .session_manager
        .save(jar, &mut session)
        .await
        .map_err(ApiError::Session)?;

    info!(
        "User {} started linking {}",
        user.id,
        state.identity_provider.name()
    );
    Ok((jar, Redirect::to(&request.url)))
}

/// Exchange the callback code and read the provider profile
async fn complete_authorization(
    state: &AppState,
    query: Result<Query<CallbackQuery>, QueryRejection>,
    pending: Option<&PendingAuthorization>,
    flow: OAuthFlow,
) -> ApiResult<(auth::ProviderProfile, TokenSet)> {
    let Query(query) = query?;
    let code = query.verified_code(pending, flow)?;
    let pkce_verifier = pending.map(|p| p.pkce_verifier.as_str()).unwrap_or_default();

    let tokens = state
        .identity_provider
        .exchange_code(flow, &code, pkce_verifier)
        .await
        .map_err(ApiError::Upstream)?;
    let profile = state
        .identity_provider
        .fetch_profile(&tokens.access_token)
        .await
        .map_err(ApiError::Upstream)?;

    Ok((profile, tokens))
}

/// Drop the round-trip state from the session so a callback is one-shot
async fn take_round_trip(
    state: &AppState,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Session, Option<PendingAuthorization>, Option<i32>)> {
    let mut session = state
        .session_manager
        .load(&jar)
        .await
        .map_err(ApiError::Session)?;

    let pending = session.data.pending_oauth.take();
    let link_user_id = session.data.link_user_id.take();

    let jar = if session.is_persisted() {
        state
            .session_manager
            .save(jar, &mut session)
            .await
            .map_err(ApiError::Session)?
    } else {
        jar
    };

    Ok((jar, session, pending, link_user_id))
}

async fn handle_login_callback(
    state: &AppState,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let (jar, session, pending, _) = take_round_trip(state, jar).await?;

    let (profile, tokens) =
        complete_authorization(state, query, pending.as_ref(), OAuthFlow::Login).await?;
    let user = oauth::sign_in_with_provider(state, &profile, &tokens).await?;

    let (jar, _) = state
        .session_manager
        .login(jar, session, user.id, false)
        .await
        .map_err(ApiError::Session)?;

    Ok((jar, Redirect::to(LOGIN_SUCCESS_REDIRECT)).into_response())
}

/// Provider callback after sign-in
pub async fn login_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    match handle_login_callback(&state, jar, query).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Spotify sign-in failed: {}", e);
            Redirect::to(LOGIN_FAILURE_REDIRECT).into_response()
        }
    }
}

/// Provider callback after linking
pub async fn link_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let (jar, session, pending, link_user_id) = match take_round_trip(&state, jar).await {
        Ok(round_trip) => round_trip,
        Err(e) => {
            error!("Failed to restore session for link callback: {}", e);
            return Redirect::to(LINK_FAILURE_REDIRECT).into_response();
        }
    };

    let Some(user_id) = link_user_id.filter(|id| session.user_id() == Some(*id)) else {
        warn!("Link callback without a logged-in link target");
        return (jar, Redirect::to(LINK_NO_USER_REDIRECT)).into_response();
    };

    let outcome =
        match complete_authorization(&state, query, pending.as_ref(), OAuthFlow::Link).await {
            Ok((profile, tokens)) => oauth::link_provider(&state, user_id, &profile, &tokens).await,
            Err(e) => Err(e),
        };

    let target = match outcome {
        Ok(LinkOutcome::Linked) => LINK_SUCCESS_REDIRECT,
        Ok(LinkOutcome::AlreadyLinkedElsewhere) => LINK_TAKEN_REDIRECT,
        Err(e) => {
            warn!("Spotify link failed for user {}: {}", user_id, e);
            LINK_FAILURE_REDIRECT
        }
    };

    (jar, Redirect::to(target)).into_response()
}

/// Raw Spotify profile of the logged-in user
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let access_token = oauth::access_token_for(&state, user.id).await?;
    let profile = state
        .identity_provider
        .fetch_profile(&access_token)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(Json(profile.raw))
}

/// Top tracks of the logged-in user
pub async fn top_tracks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let access_token = oauth::access_token_for(&state, user.id).await?;
    let tracks = state
        .identity_provider
        .top_tracks(&access_token)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(Json(tracks))
}
