//! Local registration, login and logout

use auth::password;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{LoginRequest, NewUser, RegisterRequest},
    state::AppState,
    validation::ValidatedJson,
};

const USERNAME_TAKEN: &str = "Username already exists";

/// Register a local account and log it in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if state
        .user_repository
        .find_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(USERNAME_TAKEN.to_string()));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let new_user = NewUser {
        username: payload.username,
        password_hash: Some(password_hash),
        email: payload.email,
        profile_image: None,
        location: payload.location,
    };

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(e) if e.is_conflict() => {
            warn!("Registration raced on username {}", new_user.username);
            return Err(ApiError::BadRequest(USERNAME_TAKEN.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let session = state
        .session_manager
        .load(&jar)
        .await
        .map_err(ApiError::Session)?;
    let (jar, _) = state
        .session_manager
        .login(jar, session, user.id, false)
        .await
        .map_err(ApiError::Session)?;

    info!("Registered user {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for user: {}", payload.username);

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await?;

    let stored_hash = user.as_ref().and_then(|u| u.password_hash.as_deref());
    let verified = password::verify_password(&payload.password, stored_hash).unwrap_or_else(|e| {
        error!("Unusable password hash for user {}: {:#}", payload.username, e);
        false
    });

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!("Failed login for user: {}", payload.username);
            return Err(ApiError::InvalidCredentials);
        }
    };

    let session = state
        .session_manager
        .load(&jar)
        .await
        .map_err(ApiError::Session)?;
    let (jar, _) = state
        .session_manager
        .login(jar, session, user.id, payload.remember_me)
        .await
        .map_err(ApiError::Session)?;

    Ok((jar, Json(user)))
}

/// End the session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let session = state
        .session_manager
        .load(&jar)
        .await
        .map_err(ApiError::Session)?;
    let jar = state
        .session_manager
        .destroy(jar, &session)
        .await
        .map_err(ApiError::Session)?;

    Ok((jar, Json(json!({ "message": "Logged out" }))))
}

/// The logged-in user
pub async fn current_user(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user)
}
