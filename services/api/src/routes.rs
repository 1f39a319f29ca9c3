//! API service routes

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{middleware::require_admin, state::AppState};

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod events;
pub mod recommendations;
pub mod reviews;
pub mod spotify;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id", patch(admin::update_user))
        .route(
            "/artists",
            get(admin::list_artists).post(admin::create_artist),
        )
        .route("/artists/:id", delete(admin::delete_artist))
        .route("/albums", get(admin::list_albums).post(admin::create_album))
        .route("/albums/:id", delete(admin::delete_album))
        .route("/events", get(admin::list_events).post(admin::create_event))
        .route("/events/:id", delete(admin::delete_event))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/user", get(auth::current_user))
        .route("/api/auth/spotify", get(spotify::begin_login))
        .route("/api/auth/spotify/callback", get(spotify::login_callback))
        .route("/api/link/spotify", get(spotify::begin_link))
        .route("/api/link/spotify/callback", get(spotify::link_callback))
        .route("/api/spotify/me", get(spotify::profile))
        .route("/api/spotify/top-tracks", get(spotify::top_tracks))
        .route("/api/artists", get(catalog::list_artists))
        .route("/api/artists/:id", get(catalog::get_artist))
        .route("/api/albums", get(catalog::list_albums))
        .route("/api/albums/:id", get(catalog::get_album))
        .route(
            "/api/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/api/events/:location", get(events::events_by_location))
        .route("/api/recommendations", post(recommendations::recommend))
        .route("/api/analyze-review", post(recommendations::analyze_review))
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "disc-api"
    }))
}
