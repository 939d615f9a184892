//! User DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::AuthSession;
use crate::domain::CreateUserDto;

/// Authenticated user returned by every successful register/login call
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
    /// Signed session token (JWT)
    pub token: String,
}

impl From<AuthSession> for UserDto {
    fn from(session: AuthSession) -> Self {
        Self {
            id: session.user.id,
            username: session.user.username,
            email: session.user.email,
            roles: session.roles,
            token: session.token,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 256, message = "username is required"))]
    pub username: String,
    /// Checked against the password policy by the identity store
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
}

impl RegisterRequest {
    pub fn into_parts(self) -> (CreateUserDto, Option<String>) {
        let dto = CreateUserDto {
            username: self.username,
            email: self.email,
            ..CreateUserDto::default()
        };
        (dto, self.password)
    }
}

/// An empty username is looked up like any other and fails with 401.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Google ID token passed in the query string
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    /// Google-issued ID token (JWT)
    #[serde(default)]
    pub token: String,
}
