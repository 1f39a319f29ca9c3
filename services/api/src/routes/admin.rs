//! Admin console: users, catalog and events. Every handler here sits behind
//! `require_admin`.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{AlbumQuery, NewAlbum, NewArtist, NewEvent, UpdateUserRequest, User},
    state::AppState,
    validation::{ApiPath, ValidatedJson, ValidationErrors},
};

/// Get all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_repository.list().await?;
    Ok(Json(users))
}

/// Grant or revoke admin
pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .set_admin(id, payload.is_admin)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(
        "Admin {} set is_admin={} on user {}",
        admin.id, user.is_admin, user.id
    );
    Ok(Json(user))
}

pub async fn list_artists(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let artists = state.artist_repository.list().await?;
    Ok(Json(artists))
}

pub async fn create_artist(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewArtist>,
) -> ApiResult<impl IntoResponse> {
    let artist = state.artist_repository.create(&payload).await?;
    info!("Created artist {} ({})", artist.name, artist.id);
    Ok((StatusCode::CREATED, Json(artist)))
}

pub async fn delete_artist(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    if !state.artist_repository.delete(id).await? {
        return Err(ApiError::NotFound("Artist not found".to_string()));
    }
    info!("Deleted artist {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_albums(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let albums = state.album_repository.list(&AlbumQuery::default()).await?;
    Ok(Json(albums))
}

/// Create an album for an existing artist
pub async fn create_album(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewAlbum>,
) -> ApiResult<impl IntoResponse> {
    if state
        .artist_repository
        .find_by_id(payload.artist_id)
        .await?
        .is_none()
    {
        return Err(ApiError::Validation(ValidationErrors::single(
            "artistId",
            "Artist does not exist",
        )));
    }

    let album = state.album_repository.create(&payload).await?;
    info!("Created album {} ({})", album.title, album.id);
    Ok((StatusCode::CREATED, Json(album)))
}

pub async fn delete_album(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    if !state.album_repository.delete(id).await? {
        return Err(ApiError::NotFound("Album not found".to_string()));
    }
    info!("Deleted album {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_events(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let events = state.event_repository.list().await?;
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewEvent>,
) -> ApiResult<impl IntoResponse> {
    let event = state.event_repository.create(&payload).await?;
    info!("Created event {} ({})", event.title, event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn delete_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    if !state.event_repository.delete(id).await? {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }
    info!("Deleted event {}", id);
    Ok(StatusCode::NO_CONTENT)
}
