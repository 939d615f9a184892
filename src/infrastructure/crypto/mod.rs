//! Cryptography: password hashing, session JWTs and external ID tokens

pub mod jwt;
pub mod oauth;
pub mod password;
pub mod token_issuer;

pub use jwt::JwtConfig;
pub use oauth::ExternalTokenVerifier;
pub use token_issuer::JwtTokenIssuer;
