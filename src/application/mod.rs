//! Application layer - authentication use-cases and their ports

pub mod identity;
pub mod ports;

pub use identity::{AuthError, AuthService, AuthSession};
pub use ports::{SessionIdentity, TokenError, TokenIssuer};
