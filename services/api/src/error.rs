//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::validation::ValidationErrors;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const LINK_LOGIN_REQUIRED: &str = "You must be logged in to link accounts";

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Wrong username or password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No logged-in user on a protected route
    #[error("{0}")]
    Unauthenticated(&'static str),

    /// Stored provider tokens can no longer be used
    #[error("Spotify access expired, please reconnect your account")]
    ReauthorizationRequired,

    /// Logged in but not an admin
    #[error("Access denied. Admin privileges required.")]
    Forbidden,

    /// Request body failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Spotify or OpenAI call failed
    #[error("Upstream error: {0:#}")]
    Upstream(anyhow::Error),

    /// Session store failure
    #[error("Session error: {0:#}")]
    Session(anyhow::Error),

    /// Any other internal failure
    #[error("Internal error: {0:#}")]
    Internal(anyhow::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(ValidationErrors::single("path", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(ValidationErrors::single("query", rejection.body_text()))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Internal(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidCredentials | ApiError::ReauthorizationRequired => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Unauthenticated(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Validation(errors) => {
                let body = Json(json!({
                    "message": "Validation failed",
                    "errors": errors,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            ApiError::Upstream(_)
            | ApiError::Session(_)
            | ApiError::Internal(_)
            | ApiError::Database(_) => {
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
