//! Account creation rules enforced by identity stores.

use serde::{Deserialize, Serialize};

const DEFAULT_USERNAME_CHARACTERS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._@+";

/// Username and password requirements checked when an account is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountPolicy {
    pub required_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
    /// Characters a username may consist of. Empty allows anything.
    pub allowed_username_characters: String,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            required_length: 4,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
            allowed_username_characters: DEFAULT_USERNAME_CHARACTERS.to_string(),
        }
    }
}

impl AccountPolicy {
    pub fn validate_username(&self, username: &str) -> Vec<String> {
        let allowed = &self.allowed_username_characters;
        let valid = !username.is_empty()
            && (allowed.is_empty() || username.chars().all(|c| allowed.contains(c)));

        if valid {
            Vec::new()
        } else {
            vec![format!(
                "Username '{}' is invalid, can only contain letters or digits.",
                username
            )]
        }
    }

    pub fn validate_password(&self, password: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if password.chars().count() < self.required_length {
            errors.push(format!(
                "Passwords must be at least {} characters.",
                self.required_length
            ));
        }
        if self.require_non_alphanumeric && password.chars().all(|c| c.is_alphanumeric()) {
            errors.push("Passwords must have at least one non alphanumeric character.".into());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Passwords must have at least one digit ('0'-'9').".into());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push("Passwords must have at least one lowercase ('a'-'z').".into());
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push("Passwords must have at least one uppercase ('A'-'Z').".into());
        }

        errors
    }
}
