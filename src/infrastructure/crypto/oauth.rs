//! Third-party (Google) ID token verification
//!
//! Tokens are verified against a configured key before any claim is read:
//! signature, expiry, issuer and (when configured) audience.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer};

use crate::application::ports::TokenError;
use crate::config::OAuthConfig;
use crate::domain::OAuthDescriptor;

/// Claims read from a provider ID token.
#[derive(Debug, Deserialize)]
struct ExternalClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "bool_or_string")]
    email_verified: Option<bool>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

/// Some providers encode `email_verified` as the string "true".
fn bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => Some(b),
        Some(Flag::Text(s)) => Some(s.eq_ignore_ascii_case("true")),
        None => None,
    })
}

pub struct ExternalTokenVerifier {
    provider: String,
    key: Option<DecodingKey>,
    validation: Validation,
    require_verified_email: bool,
}

impl ExternalTokenVerifier {
    pub fn from_config(config: &OAuthConfig) -> Result<Self, TokenError> {
        let (key, algorithm) = if let Some(pem) = &config.rsa_public_key_pem {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| TokenError::Invalid(format!("bad RSA public key: {}", e)))?;
            (Some(key), Algorithm::RS256)
        } else if let Some(secret) = &config.shared_secret {
            (Some(DecodingKey::from_secret(secret.as_bytes())), Algorithm::HS256)
        } else {
            (None, Algorithm::RS256)
        };

        let mut validation = Validation::new(algorithm);
        if !config.issuers.is_empty() {
            validation.set_issuer(config.issuers.as_slice());
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            provider: config.provider.clone(),
            key,
            validation,
            require_verified_email: config.require_verified_email,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    pub fn decode(&self, token: &str) -> Result<OAuthDescriptor, TokenError> {
        let key = self.key.as_ref().ok_or(TokenError::Unconfigured)?;

        let claims = decode::<ExternalClaims>(token, key, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?
            .claims;

        // An email only becomes the username once the provider vouches for it.
        if self.require_verified_email
            && claims.email.is_some()
            && claims.email_verified != Some(true)
        {
            return Err(TokenError::Invalid("email is not verified".into()));
        }

        let username = claims.email.clone().unwrap_or_else(|| claims.sub.clone());

        Ok(OAuthDescriptor {
            provider: self.provider.clone(),
            username,
            email: claims.email,
            given_name: claims.given_name,
            family_name: claims.family_name,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    pub(crate) const SECRET: &str = "google-test-secret";
    pub(crate) const AUDIENCE: &str = "shop-client-id";

    pub(crate) fn test_config() -> OAuthConfig {
        OAuthConfig {
            audience: Some(AUDIENCE.into()),
            shared_secret: Some(SECRET.into()),
            ..OAuthConfig::default()
        }
    }

    pub(crate) fn google_token(extra: Value) -> String {
        let mut claims = json!({
            "iss": "https://accounts.google.com",
            "aud": AUDIENCE,
            "sub": "1094523",
            "exp": Utc::now().timestamp() + 600,
            "iat": Utc::now().timestamp(),
        });
        if let (Some(base), Some(extra)) = (claims.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn email_becomes_username() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let token = google_token(json!({
            "email": "bob@example.com",
            "email_verified": true,
            "given_name": "Bob",
            "family_name": "Builder",
        }));

        let descriptor = verifier.decode(&token).unwrap();
        assert_eq!(descriptor.provider, "google");
        assert_eq!(descriptor.username, "bob@example.com");
        assert_eq!(descriptor.given_name.as_deref(), Some("Bob"));
        assert_eq!(descriptor.family_name.as_deref(), Some("Builder"));
    }

    #[test]
    fn subject_is_used_without_email() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let descriptor = verifier.decode(&google_token(json!({}))).unwrap();
        assert_eq!(descriptor.username, "1094523");
        assert!(descriptor.email.is_none());
    }

    #[test]
    fn string_email_verified_flag_is_accepted() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let token = google_token(json!({"email": "c@example.com", "email_verified": "true"}));
        assert!(verifier.decode(&token).is_ok());
    }

    #[test]
    fn unverified_email_is_rejected() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let token = google_token(json!({"email": "c@example.com", "email_verified": false}));
        assert!(matches!(verifier.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn missing_email_verified_claim_is_rejected() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let token = google_token(json!({"email": "c@example.com"}));
        assert!(matches!(verifier.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn unverified_email_is_accepted_when_not_required() {
        let verifier = ExternalTokenVerifier::from_config(&OAuthConfig {
            require_verified_email: false,
            ..test_config()
        })
        .unwrap();
        let token = google_token(json!({"email": "c@example.com"}));
        assert_eq!(verifier.decode(&token).unwrap().username, "c@example.com");
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let token = google_token(json!({"aud": "someone-elses-client"}));
        assert!(verifier.decode(&token).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let token = google_token(json!({"iss": "https://evil.example.com"}));
        assert!(verifier.decode(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        let token = google_token(json!({"exp": Utc::now().timestamp() - 3600}));
        assert!(verifier.decode(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let verifier = ExternalTokenVerifier::from_config(&test_config()).unwrap();
        assert!(verifier.decode("not.a.jwt").is_err());
    }

    #[test]
    fn unconfigured_verifier_refuses_everything() {
        let verifier = ExternalTokenVerifier::from_config(&OAuthConfig::default()).unwrap();
        assert!(!verifier.is_configured());
        let token = google_token(json!({}));
        assert!(matches!(verifier.decode(&token), Err(TokenError::Unconfigured)));
    }
}
