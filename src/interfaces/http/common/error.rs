//! Mapping of authentication failures onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::application::AuthError;

/// An [`AuthError`] with the status code chosen by the endpoint.
///
/// Registration endpoints answer every refusal with 400, sign-in endpoints
/// with 401. Service failures are always 500 and never leak details.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: AuthError,
}

impl ApiError {
    pub fn registration(error: AuthError) -> Self {
        Self::with_client_status(error, StatusCode::BAD_REQUEST)
    }

    pub fn sign_in(error: AuthError) -> Self {
        Self::with_client_status(error, StatusCode::UNAUTHORIZED)
    }

    fn with_client_status(error: AuthError, status: StatusCode) -> Self {
        let status = if error.is_client_error() {
            status
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self { status, error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            error!(error = ?self.error, "Request failed");
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        (self.status, Json(ApiResponse::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::TokenError;
    use crate::domain::DomainError;

    #[test]
    fn client_refusals_use_the_endpoint_status() {
        assert_eq!(
            ApiError::registration(AuthError::DuplicateUser).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::registration(AuthError::CreationRejected(vec!["x".into()])).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::sign_in(AuthError::UserNotFound("bob".into())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::sign_in(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn registration_refuses_bad_tokens_with_400() {
        let err = AuthError::InvalidExternalToken(TokenError::Unconfigured);
        assert_eq!(ApiError::registration(err).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_are_500_on_every_endpoint() {
        let err = AuthError::Store(DomainError::Storage("locked".into()));
        assert_eq!(
            ApiError::registration(err).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let err = AuthError::TokenIssue(TokenError::Signing("bad key".into()));
        assert_eq!(
            ApiError::sign_in(err).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
