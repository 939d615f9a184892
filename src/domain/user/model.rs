use chrono::{DateTime, Utc};

/// Provider name stored for accounts created with a local password.
pub const LOCAL_PROVIDER: &str = "local";

/// How an account proves its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Local account with a bcrypt password hash.
    Password { hash: String },
    /// Externally authenticated account; there is no local password.
    External { provider: String },
}

impl Credential {
    pub fn provider(&self) -> &str {
        match self {
            Self::Password { .. } => LOCAL_PROVIDER,
            Self::External { provider } => provider,
        }
    }
}

/// Credential supplied when an account is created, before hashing.
#[derive(Debug, Clone)]
pub enum NewCredential {
    Password(String),
    External { provider: String },
}

/// User model
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub credential: Credential,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_external(&self) -> bool {
        matches!(self.credential, Credential::External { .. })
    }
}

/// Key used for username lookups and the uniqueness constraint.
///
/// Usernames compare case-insensitively: "Alice" and "alice" are the same account.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_surrounding_whitespace() {
        assert_eq!(normalize_username("Alice"), normalize_username(" alice "));
        assert_ne!(normalize_username("alice"), normalize_username("alice2"));
    }

    #[test]
    fn provider_reflects_credential_kind() {
        let local = Credential::Password { hash: "$2b$04$x".into() };
        let google = Credential::External { provider: "google".into() };
        assert_eq!(local.provider(), LOCAL_PROVIDER);
        assert_eq!(google.provider(), "google");
    }
}
