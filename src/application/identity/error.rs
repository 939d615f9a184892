//! Failures surfaced by the authentication use-cases

use thiserror::Error;

use crate::application::ports::TokenError;
use crate::domain::DomainError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User with this name already exists")]
    DuplicateUser,

    /// The identity store refused the account (password or username policy).
    #[error("{}", .0.join(" "))]
    CreationRejected(Vec<String>),

    #[error("There is not user with username {0}")]
    UserNotFound(String),

    #[error("Wrong password")]
    InvalidCredentials,

    #[error("Invalid external token")]
    InvalidExternalToken(#[source] TokenError),

    #[error("Failed to issue session token: {0}")]
    TokenIssue(#[source] TokenError),

    #[error("Identity store failure: {0}")]
    Store(#[source] DomainError),
}

impl From<DomainError> for AuthError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Conflict(_) => Self::DuplicateUser,
            DomainError::Rejected(reasons) => Self::CreationRejected(reasons),
            other => Self::Store(other),
        }
    }
}

impl AuthError {
    /// Short machine-readable name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateUser => "duplicate_user",
            Self::CreationRejected(_) => "creation_rejected",
            Self::UserNotFound(_) => "user_not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidExternalToken(_) => "invalid_external_token",
            Self::TokenIssue(_) => "token_issue",
            Self::Store(_) => "store",
        }
    }

    /// Whether the failure is the caller's fault rather than the service's.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::TokenIssue(_) | Self::Store(_))
    }
}
