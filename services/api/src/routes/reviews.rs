//! Album reviews

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use crate::{
    error::ApiResult,
    middleware::CurrentUser,
    models::{CreateReviewRequest, NewReview},
    state::AppState,
    validation::ValidatedJson,
};

/// Get all reviews, newest first
pub async fn list_reviews(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let reviews = state.review_repository.list().await?;
    Ok(Json(reviews))
}

/// Review an album as the logged-in user
pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let review = state
        .review_repository
        .create(&NewReview::from_request(user.id, payload))
        .await?;

    info!("User {} reviewed album {}", user.id, review.album_id);
    Ok((StatusCode::CREATED, Json(review)))
}
