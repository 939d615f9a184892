//! Identity store support shared by the SeaORM and in-memory stores

mod memory;

pub use memory::InMemoryIdentityStore;

use crate::domain::{AccountPolicy, Credential, DomainError, DomainResult, NewCredential};
use crate::infrastructure::crypto::password::{hash_password, verify_password};

/// Validate a new account against the policy and hash its password.
///
/// All policy violations are collected into a single `DomainError::Rejected`.
pub(crate) async fn prepare_credential(
    policy: &AccountPolicy,
    bcrypt_cost: u32,
    username: &str,
    credential: NewCredential,
) -> DomainResult<Credential> {
    let mut reasons = policy.validate_username(username);

    match credential {
        NewCredential::Password(password) => {
            reasons.extend(policy.validate_password(&password));
            if !reasons.is_empty() {
                return Err(DomainError::Rejected(reasons));
            }

            let hash = tokio::task::spawn_blocking(move || {
                hash_password(&password, bcrypt_cost)
            })
            .await
            .map_err(|e| DomainError::Storage(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| DomainError::Storage(format!("Failed to hash password: {}", e)))?;

            Ok(Credential::Password { hash })
        }
        NewCredential::External { provider } => {
            if !reasons.is_empty() {
                return Err(DomainError::Rejected(reasons));
            }
            Ok(Credential::External { provider })
        }
    }
}

/// Check a password against a stored credential. External accounts never match.
pub(crate) async fn check_credential(credential: &Credential, password: &str) -> DomainResult<bool> {
    let Credential::Password { hash } = credential else {
        return Ok(false);
    };

    let hash = hash.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| DomainError::Storage(format!("Password verification task failed: {}", e)))?
        .map_err(|e| DomainError::Storage(format!("Stored password hash is unreadable: {}", e)))
}
