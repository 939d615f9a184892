//! Application ports (hexagonal architecture boundaries)
//!
//! The identity store contract lives in `domain::user`; outbound ports that
//! the application layer depends on live here.

pub mod outbound;

pub use outbound::{SessionIdentity, TokenError, TokenIssuer};
