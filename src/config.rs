//! Configuration module
//!
//! The service reads a single TOML file (default
//! `~/.config/shop-identity/config.toml`). Every section is optional;
//! missing keys fall back to the defaults below.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//!
//! [security]
//! jwt_secret = "change-me"
//!
//! [oauth]
//! audience = "1234.apps.googleusercontent.com"
//! rsa_public_key_pem = "-----BEGIN PUBLIC KEY-----..."
//!
//! [accounts.policy]
//! required_length = 8
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AccountPolicy;

/// Longest session token lifetime accepted, ten years.
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 87_600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shop-identity")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub oauth: OAuthConfig,
    pub accounts: AccountsConfig,
    /// Account created on startup when it does not exist yet.
    pub admin: Option<AdminConfig>,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    ///
    /// `JWT_SECRET` and `DATABASE_URL` override the file when set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&raw)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret must not be empty".into()));
        }
        if !(1..=MAX_JWT_EXPIRATION_HOURS).contains(&self.security.jwt_expiration_hours) {
            return Err(ConfigError::Invalid(format!(
                "security.jwt_expiration_hours must be between 1 and {}",
                MAX_JWT_EXPIRATION_HOURS
            )));
        }
        if !(4..=31).contains(&self.accounts.bcrypt_cost) {
            return Err(ConfigError::Invalid(
                "accounts.bcrypt_cost must be between 4 and 31".into(),
            ));
        }
        if self.accounts.default_role.trim().is_empty() {
            return Err(ConfigError::Invalid("accounts.default_role must not be empty".into()));
        }
        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./identity.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub jwt_issuer: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "super-secret-key-change-in-production".to_string(),
            jwt_expiration_hours: 24,
            jwt_issuer: "shop-identity".to_string(),
        }
    }
}

/// Verification settings for third-party ID tokens.
///
/// Exactly one key source is used: `rsa_public_key_pem` (RS256) wins over
/// `shared_secret` (HS256). With neither set, every external token is refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub provider: String,
    pub issuers: Vec<String>,
    /// Expected `aud` claim (the OAuth client id). Unchecked when absent.
    pub audience: Option<String>,
    pub rsa_public_key_pem: Option<String>,
    pub shared_secret: Option<String>,
    pub require_verified_email: bool,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            issuers: vec![
                "https://accounts.google.com".to_string(),
                "accounts.google.com".to_string(),
            ],
            audience: None,
            rsa_public_key_pem: None,
            shared_secret: None,
            require_verified_email: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Role granted to every newly registered account.
    pub default_role: String,
    pub bcrypt_cost: u32,
    pub policy: AccountPolicy,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            default_role: "buyer".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            policy: AccountPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    #[serde(default = "default_admin_role")]
    pub role: String,
}

fn default_admin_role() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.accounts.default_role, "buyer");
        assert_eq!(config.oauth.provider, "google");
        assert!(config.admin.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [accounts.policy]
            required_length = 8
            require_uppercase = false

            [admin]
            username = "root"
            password = "Root1!"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.accounts.policy.required_length, 8);
        assert!(!config.accounts.policy.require_uppercase);
        assert!(config.accounts.policy.require_digit);
        let admin = config.admin.unwrap();
        assert_eq!(admin.role, "admin");
    }

    #[test]
    fn rejects_unknown_log_format() {
        let config = AppConfig::from_toml("[logging]\nformat = \"xml\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_out_of_range_bcrypt_cost() {
        let config = AppConfig::from_toml("[accounts]\nbcrypt_cost = 2").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_token_lifetime() {
        for hours in ["0", "87601", "9223372036854775807"] {
            let raw = format!("[security]\njwt_expiration_hours = {}", hours);
            let config = AppConfig::from_toml(&raw).unwrap();
            assert!(config.validate().is_err(), "accepted {hours}");
        }
        let config = AppConfig::from_toml("[security]\njwt_expiration_hours = 87600").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn address_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".into(),
            port: 5001,
            shutdown_timeout: 5,
        };
        assert_eq!(server.address(), "127.0.0.1:5001");
    }
}
