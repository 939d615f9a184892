use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use tracing::debug;

use crate::domain::{
    normalize_username, AccountPolicy, CreateUserDto, Credential, DomainError, DomainResult,
    IdentityStore, NewCredential, User, LOCAL_PROVIDER,
};
use crate::infrastructure::database::entities::{user, user_role};
use crate::infrastructure::storage::{check_credential, prepare_credential};

pub struct SeaOrmIdentityStore {
    db: DatabaseConnection,
    policy: AccountPolicy,
    bcrypt_cost: u32,
}

impl SeaOrmIdentityStore {
    pub fn new(db: DatabaseConnection, policy: AccountPolicy, bcrypt_cost: u32) -> Self {
        Self {
            db,
            policy,
            bcrypt_cost,
        }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> User {
    let credential = match model.password_hash {
        Some(hash) if model.auth_provider == LOCAL_PROVIDER => Credential::Password { hash },
        _ => Credential::External {
            provider: model.auth_provider,
        },
    };

    User {
        id: model.id,
        username: model.username,
        email: model.email,
        given_name: model.given_name,
        family_name: model.family_name,
        credential,
        created_at: model.created_at,
    }
}

fn domain_to_active_model(user: &User) -> user::ActiveModel {
    let password_hash = match &user.credential {
        Credential::Password { hash } => Some(hash.clone()),
        Credential::External { .. } => None,
    };

    user::ActiveModel {
        id: Set(user.id.clone()),
        username: Set(user.username.clone()),
        normalized_username: Set(normalize_username(&user.username)),
        email: Set(user.email.clone()),
        given_name: Set(user.given_name.clone()),
        family_name: Set(user.family_name.clone()),
        password_hash: Set(password_hash),
        auth_provider: Set(user.credential.provider().to_string()),
        created_at: Set(user.created_at),
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl IdentityStore for SeaOrmIdentityStore {
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::NormalizedUsername.eq(normalize_username(username)))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
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

        let txn = self.db.begin().await.map_err(db_err)?;

        user::Entity::insert(domain_to_active_model(&user))
            .exec_without_returning(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Conflict(format!("Username {} already exists", user.username))
                } else {
                    db_err(e)
                }
            })?;

        user_role::Entity::insert(user_role::ActiveModel {
            user_id: Set(user.id.clone()),
            role: Set(initial_role.to_string()),
        })
        .exec_without_returning(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        debug!(user_id = %user.id, role = initial_role, "User row and initial role committed");
        Ok(user)
    }

    async fn add_to_role(&self, user: &User, role: &str) -> DomainResult<()> {
        let existing = user_role::Entity::find_by_id((user.id.clone(), role.to_string()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if existing.is_some() {
            return Ok(());
        }

        let result = user_role::Entity::insert(user_role::ActiveModel {
            user_id: Set(user.id.clone()),
            role: Set(role.to_string()),
        })
        .exec_without_returning(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            // Granted concurrently by another request
            Err(e) if is_unique_violation(&e) => Ok(()),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn get_roles(&self, user: &User) -> DomainResult<Vec<String>> {
        let rows = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(&user.id))
            .order_by_asc(user_role::Column::Role)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(|row| row.role).collect())
    }

    async fn check_password(&self, user: &User, password: &str) -> DomainResult<bool> {
        check_credential(&user.credential, password).await
    }
}
