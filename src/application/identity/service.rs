//! Authentication service: application-layer orchestration
//!
//! Registration, password login and Google sign-in all end the same way:
//! look up the account, load its roles and mint a session token.
//! HTTP handlers are thin wrappers around this service.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::AuthError;
use crate::application::ports::TokenIssuer;
use crate::domain::{CreateUserDto, IdentityStore, NewCredential, User};

/// Result of a successful authentication
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub roles: Vec<String>,
    pub token: String,
}

pub struct AuthService {
    store: Arc<dyn IdentityStore>,
    tokens: Arc<dyn TokenIssuer>,
    default_role: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        tokens: Arc<dyn TokenIssuer>,
        default_role: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tokens,
            default_role: default_role.into(),
        }
    }

    pub fn tokens(&self) -> &dyn TokenIssuer {
        self.tokens.as_ref()
    }

    // ── Local accounts ──────────────────────────────────────────

    /// Register a local account with the default role.
    ///
    /// A missing password is checked against the account policy like an
    /// empty one, so it is rejected with the policy's reasons.
    pub async fn register(
        &self,
        dto: CreateUserDto,
        password: Option<String>,
    ) -> Result<AuthSession, AuthError> {
        let username = dto.username.clone();
        let credential = NewCredential::Password(password.unwrap_or_default());
        let result = self.provision(dto, credential).await;
        record("register", &username, &result);
        result
    }

    /// Authenticate with username + password. Failed attempts are not throttled here.
    pub async fn login(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let result = self.login_inner(username, password.unwrap_or_default()).await;
        record("login", username, &result);
        result
    }

    async fn login_inner(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;

        if !self.store.check_password(&user, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        self.open_session(user).await
    }

    // ── External (Google) accounts ──────────────────────────────

    /// Create an account from a verified external ID token.
    ///
    /// The account gets no local password and the same default role as
    /// [`register`](Self::register).
    pub async fn oauth_register(&self, external_token: &str) -> Result<AuthSession, AuthError> {
        let descriptor = match self.tokens.decode_external(external_token) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                let result = Err(AuthError::InvalidExternalToken(e));
                record("oauth_register", "", &result);
                return result;
            }
        };

        let username = descriptor.username.clone();
        let credential = NewCredential::External {
            provider: descriptor.provider.clone(),
        };
        let result = self
            .provision(CreateUserDto::from(descriptor), credential)
            .await;
        record("oauth_register", &username, &result);
        result
    }

    /// Sign in with a verified external ID token. No password is involved.
    pub async fn oauth_login(&self, external_token: &str) -> Result<AuthSession, AuthError> {
        let result = self.oauth_login_inner(external_token).await;
        let username = result
            .as_ref()
            .map(|session| session.user.username.as_str())
            .unwrap_or_default();
        record("oauth_login", username, &result);
        result
    }

    async fn oauth_login_inner(&self, external_token: &str) -> Result<AuthSession, AuthError> {
        let descriptor = self
            .tokens
            .decode_external(external_token)
            .map_err(AuthError::InvalidExternalToken)?;

        let user = self
            .store
            .find_by_username(&descriptor.username)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(descriptor.username.clone()))?;

        self.open_session(user).await
    }

    // ── Provisioning ────────────────────────────────────────────

    /// Make sure an account exists and holds `role`, creating it when absent.
    ///
    /// Used to bootstrap the administrator account on startup.
    pub async fn ensure_account(
        &self,
        dto: CreateUserDto,
        password: String,
        role: &str,
    ) -> Result<User, AuthError> {
        if let Some(existing) = self.store.find_by_username(&dto.username).await? {
            self.store.add_to_role(&existing, role).await?;
            return Ok(existing);
        }

        let user = self
            .store
            .create_user(dto, NewCredential::Password(password), role)
            .await?;
        info!(user_id = %user.id, username = %user.username, role, "Account provisioned");
        Ok(user)
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn provision(
        &self,
        dto: CreateUserDto,
        credential: NewCredential,
    ) -> Result<AuthSession, AuthError> {
        if self.store.find_by_username(&dto.username).await?.is_some() {
            return Err(AuthError::DuplicateUser);
        }

        // The store's uniqueness constraint still decides if another
        // request registered the same name since the lookup.
        let user = self
            .store
            .create_user(dto, credential, &self.default_role)
            .await?;

        self.open_session(user).await
    }

    async fn open_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let mut roles = self.store.get_roles(&user).await?;

        if roles.is_empty() {
            warn!(
                user_id = %user.id,
                role = %self.default_role,
                "Account has no roles, granting the default role"
            );
            self.store.add_to_role(&user, &self.default_role).await?;
            roles = self.store.get_roles(&user).await?;
        }

        let token = self
            .tokens
            .issue(&user, &roles)
            .map_err(AuthError::TokenIssue)?;

        Ok(AuthSession { user, roles, token })
    }
}

fn record(operation: &'static str, username: &str, result: &Result<AuthSession, AuthError>) {
    match result {
        Ok(session) => {
            info!(
                operation,
                user_id = %session.user.id,
                username = %session.user.username,
                "Authentication succeeded"
            );
            metrics::counter!("auth_attempts_total", "operation" => operation, "outcome" => "success")
                .increment(1);
        }
        Err(e) => {
            if e.is_client_error() {
                warn!(operation, username, error = %e, "Authentication refused");
            } else {
                tracing::error!(operation, username, error = %e, "Authentication failed");
            }
            metrics::counter!("auth_attempts_total", "operation" => operation, "outcome" => e.kind())
                .increment(1);
        }
    }
}
