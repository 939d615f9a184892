//! Outbound ports: token minting and external token verification
//!
//! [`TokenIssuer`] is the contract between the auth use-cases and the
//! cryptography that backs them. The production implementation is
//! [`JwtTokenIssuer`](crate::infrastructure::crypto::JwtTokenIssuer).

use thiserror::Error;

use crate::domain::{OAuthDescriptor, User};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("external token verification is not configured")]
    Unconfigured,
}

/// Identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
    pub username: String,
    pub roles: Vec<String>,
}

pub trait TokenIssuer: Send + Sync {
    /// Mint a signed session token for the user and role set.
    fn issue(&self, user: &User, roles: &[String]) -> Result<String, TokenError>;

    /// Verify a session token previously minted by [`issue`](Self::issue).
    fn verify(&self, token: &str) -> Result<SessionIdentity, TokenError>;

    /// Verify a third-party ID token and extract the identity it asserts.
    fn decode_external(&self, token: &str) -> Result<OAuthDescriptor, TokenError>;
}
