use async_trait::async_trait;

use super::{CreateUserDto, NewCredential, User};
use crate::shared::DomainResult;

/// Persistence and credential verification for user accounts.
///
/// Implementations own the account policy and password hashing.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// Create the account and grant `initial_role` as one atomic operation.
    ///
    /// Fails with `DomainError::Rejected` when the account policy refuses the
    /// username or password, and `DomainError::Conflict` when the username is
    /// already taken (including when a concurrent request won the race).
    async fn create_user(
        &self,
        dto: CreateUserDto,
        credential: NewCredential,
        initial_role: &str,
    ) -> DomainResult<User>;

    /// Grant a role. Granting a role the user already has is a no-op.
    async fn add_to_role(&self, user: &User, role: &str) -> DomainResult<()>;

    /// Roles assigned to the user, sorted.
    async fn get_roles(&self, user: &User) -> DomainResult<Vec<String>>;

    /// `false` for wrong passwords and for accounts without a local password.
    async fn check_password(&self, user: &User, password: &str) -> DomainResult<bool>;
}
