//! Identity module: registration and authentication
//!
//! Contains the `AuthService` which orchestrates local and Google
//! account use-cases and issues session tokens.

pub mod error;
pub mod service;

pub use error::AuthError;
pub use service::{AuthService, AuthSession};
