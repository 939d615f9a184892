//! User aggregate
//!
//! Contains the User entity, creation DTO, account policy, and the
//! identity store interface.

pub mod model;
pub mod policy;
pub mod repository;

mod dto_create;
mod oauth;

pub use model::{normalize_username, Credential, NewCredential, User, LOCAL_PROVIDER};
pub use policy::AccountPolicy;

pub use dto_create::CreateUserDto;
pub use oauth::OAuthDescriptor;

pub use repository::IdentityStore;
