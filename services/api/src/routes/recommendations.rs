//! Recommendation and sentiment proxy

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    recommendations::{AnalyzeReviewRequest, RecommendationRequest},
    state::AppState,
    validation::ValidatedJson,
};

/// Album suggestions for liked albums and reviews
pub async fn recommend(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<RecommendationRequest>,
) -> ApiResult<impl IntoResponse> {
    let recommendations = state
        .recommendation_engine
        .recommend(&payload.liked_albums, &payload.reviews)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(Json(recommendations))
}

/// Star rating estimated from review text
pub async fn analyze_review(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<AnalyzeReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let sentiment = state
        .recommendation_engine
        .analyze_sentiment(&payload.review)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(Json(sentiment))
}
