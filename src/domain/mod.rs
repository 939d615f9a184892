pub mod user;

// Re-export commonly used types
pub use user::{
    normalize_username, AccountPolicy, CreateUserDto, Credential, IdentityStore, NewCredential,
    OAuthDescriptor, User, LOCAL_PROVIDER,
};

pub use crate::shared::{DomainError, DomainResult};
