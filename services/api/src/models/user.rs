//! User accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{
    Validate, ValidationErrors, validate_email, validate_password, validate_required,
    validate_username,
};

/// A stored user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a user; `password_hash` is `None` for OAuth-only accounts
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
    pub location: Option<String>,
}

/// Request for user registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub location: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("username", validate_username(&self.username));
        errors.check("password", validate_password(&self.password));
        if let Some(email) = &self.email {
            errors.check("email", validate_email(email));
        }
        if let Some(location) = &self.location {
            errors.check("location", validate_required(location, "Location"));
        }
        errors.into_result()
    }
}

/// Request for local login
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("username", validate_required(&self.username, "Username"));
        errors.check("password", validate_required(&self.password, "Password"));
        errors.into_result()
    }
}

/// Admin update of a user's role
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub is_admin: bool,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}
