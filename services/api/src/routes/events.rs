//! Concert listings

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use crate::{
    error::ApiResult, middleware::CurrentUser, models::NewEvent, state::AppState,
    validation::{ApiPath, ValidatedJson},
};

/// Get all events by date
pub async fn list_events(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let events = state.event_repository.list().await?;
    Ok(Json(events))
}

/// Get the events in one location
pub async fn events_by_location(
    State(state): State<AppState>,
    ApiPath(location): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let events = state.event_repository.list_by_location(&location).await?;
    Ok(Json(events))
}

/// Add an event as a logged-in user
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<NewEvent>,
) -> ApiResult<impl IntoResponse> {
    let event = state.event_repository.create(&payload).await?;

    info!("User {} added event {}", user.id, event.id);
    Ok((StatusCode::CREATED, Json(event)))
}
