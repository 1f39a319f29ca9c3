//! Public catalog: artists and albums

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    error::{ApiError, ApiResult},
    models::AlbumQuery,
    state::AppState,
    validation::{ApiPath, ApiQuery},
};

/// Get all artists
pub async fn list_artists(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let artists = state.artist_repository.list().await?;
    Ok(Json(artists))
}

/// Get an artist by ID
pub async fn get_artist(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let artist = state
        .artist_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Artist not found".to_string()))?;

    Ok(Json(artist))
}

/// Get albums, optionally by artist and title substring
pub async fn list_albums(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AlbumQuery>,
) -> ApiResult<impl IntoResponse> {
    let albums = state.album_repository.list(&query).await?;
    Ok(Json(albums))
}

/// Get an album by ID
pub async fn get_album(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let album = state
        .album_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Album not found".to_string()))?;

    Ok(Json(album))
}
