//! In-memory identity store for development and testing

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{check_credential, prepare_credential};
use crate::domain::{
    normalize_username, AccountPolicy, CreateUserDto, DomainError, DomainResult, IdentityStore,
    NewCredential, User,
};

pub struct InMemoryIdentityStore {
    /// Keyed by normalized username
    users: DashMap<String, User>,
    /// Keyed by user id
    roles: DashMap<String, BTreeSet<String>>,
    policy: AccountPolicy,
    bcrypt_cost: u32,
}

impl InMemoryIdentityStore {
    pub fn new(policy: AccountPolicy, bcrypt_cost: u32) -> Self {
        Self {
            users: DashMap::new(),
            roles: DashMap::new(),
            policy,
            bcrypt_cost,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new(AccountPolicy::default(), bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .get(&normalize_username(username))
            .map(|entry| entry.value().clone()))
    }

    async fn create_user(
        &self,
        dto: CreateUserDto,
        credential: NewCredential,
        initial_role: &str,
    ) -> DomainResult<User> {
        let credential =
            prepare_credential(&self.policy, self.bcrypt_cost, &dto.username, credential).await?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: dto.username,
            email: dto.email,
            given_name: dto.given_name,
            family_name: dto.family_name,
            credential,
            created_at: Utc::now(),
        };

        match self.users.entry(normalize_username(&user.username)) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict(format!(
                    "Username {} already exists",
                    user.username
                )))
            }
            Entry::Vacant(slot) => {
                self.roles
                    .insert(user.id.clone(), BTreeSet::from([initial_role.to_string()]));
                slot.insert(user.clone());
            }
        }

        Ok(user)
    }

    async fn add_to_role(&self, user: &User, role: &str) -> DomainResult<()> {
        if !self.users.contains_key(&normalize_username(&user.username)) {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: user.id.clone(),
            });
        }

        self.roles
            .entry(user.id.clone())
            .or_default()
            .insert(role.to_string());
        Ok(())
    }

    async fn get_roles(&self, user: &User) -> DomainResult<Vec<String>> {
        Ok(self
            .roles
            .get(&user.id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn check_password(&self, user: &User, password: &str) -> DomainResult<bool> {
        check_credential(&user.credential, password).await
    }
}
