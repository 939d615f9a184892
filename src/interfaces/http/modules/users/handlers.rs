//! Registration and sign-in handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use super::dto::{LoginRequest, RegisterRequest, TokenQuery, UserDto};
use crate::application::AuthService;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};

#[derive(Clone)]
pub struct UserHandlerState {
    pub auth: Arc<AuthService>,
}

#[utoipa::path(
    post,
    path = "/api/user/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created and signed in", body = UserDto),
        (status = 400, description = "Name taken or account rejected by policy", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn register(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let (dto, password) = request.into_parts();
    let session = state
        .auth
        .register(dto, password)
        .await
        .map_err(ApiError::registration)?;

    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserDto),
        (status = 401, description = "Unknown user or wrong password", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn login(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let session = state
        .auth
        .login(&request.username, request.password.as_deref())
        .await
        .map_err(ApiError::sign_in)?;

    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/api/user/google-register",
    tag = "Users",
    params(TokenQuery),
    responses(
        (status = 200, description = "Google account created and signed in", body = UserDto),
        (status = 400, description = "Invalid token, name taken or account rejected", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn google_register(
    State(state): State<UserHandlerState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<UserDto>, ApiError> {
    let session = state
        .auth
        .oauth_register(&query.token)
        .await
        .map_err(ApiError::registration)?;

    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/api/user/google-login",
    tag = "Users",
    params(TokenQuery),
    responses(
        (status = 200, description = "Signed in with Google", body = UserDto),
        (status = 401, description = "Invalid token or no such account", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn google_login(
    State(state): State<UserHandlerState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<UserDto>, ApiError> {
    let session = state
        .auth
        .oauth_login(&query.token)
        .await
        .map_err(ApiError::sign_in)?;

    Ok(Json(session.into()))
}
