//! JWT-backed implementation of the [`TokenIssuer`] port

use tracing::warn;

use super::jwt::{create_token, verify_token, JwtConfig};
use super::oauth::ExternalTokenVerifier;
use crate::application::ports::{SessionIdentity, TokenError, TokenIssuer};
use crate::domain::{OAuthDescriptor, User};

pub struct JwtTokenIssuer {
    jwt_config: JwtConfig,
    external: ExternalTokenVerifier,
}

impl JwtTokenIssuer {
    pub fn new(jwt_config: JwtConfig, external: ExternalTokenVerifier) -> Self {
        if !external.is_configured() {
            warn!("No OAuth verification key configured; Google sign-in is disabled");
        }
        Self {
            jwt_config,
            external,
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user: &User, roles: &[String]) -> Result<String, TokenError> {
        create_token(&user.id, &user.username, roles, &self.jwt_config)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<SessionIdentity, TokenError> {
        let claims =
            verify_token(token, &self.jwt_config).map_err(|e| TokenError::Invalid(e.to_string()))?;

        Ok(SessionIdentity {
            user_id: claims.sub,
            username: claims.username,
            roles: claims.roles,
        })
    }

    fn decode_external(&self, token: &str) -> Result<OAuthDescriptor, TokenError> {
        self.external.decode(token)
    }
}
