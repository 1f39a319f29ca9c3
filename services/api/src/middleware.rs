//! Authorization gate: session cookie to user, and the admin check

use auth::Session;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult, NOT_AUTHENTICATED},
    models::User,
    state::AppState,
};

/// User behind a restored session. A session whose user was deleted counts
/// as logged out.
pub async fn resolve_user(state: &AppState, session: &Session) -> ApiResult<Option<User>> {
    match session.user_id() {
        Some(user_id) => Ok(state.user_repository.find_by_id(user_id).await?),
        None => Ok(None),
    }
}

/// The logged-in user; rejects with `401 Not authenticated`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session = state
            .session_manager
            .load(&jar)
            .await
            .map_err(ApiError::Session)?;

        resolve_user(state, &session)
            .await?
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated(NOT_AUTHENTICATED))
    }
}

/// A logged-in admin; rejects with 401 or `403 Access denied`
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            warn!("User {} denied access to {}", user.id, parts.uri.path());
            return Err(ApiError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}

/// Admin middleware: rejects non-admins and makes the admin available to
/// handlers as `Extension<User>`
pub async fn require_admin(AdminUser(user): AdminUser, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(user);
    next.run(req).await
}
