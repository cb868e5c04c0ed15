//! Authentication configuration
//!
//! Centralized configuration for the password hasher, the token service and
//! the session manager.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,
    /// Password hashing configuration
    #[serde(default)]
    pub password: PasswordConfig,
    /// Session policy
    #[serde(default)]
    pub session: SessionConfig,
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing tokens (should be at least 256 bits)
    pub secret: String,
    /// Access token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set in production
            access_token_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

/// Password hashing configuration (Argon2id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB (OWASP recommends 19456 KiB = 19 MiB minimum)
    pub memory_cost: u32,
    /// Time cost (iterations) - OWASP recommends 2 minimum
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Output hash length in bytes
    pub hash_length: u32,
    /// Pepper (additional secret, optional)
    pub pepper: Option<String>,
    /// Maximum password length in bytes (to prevent DoS)
    pub max_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            pepper: None,
            max_password_length: 1024,
        }
    }
}

/// Session policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Create an account when an unknown username logs in.
    ///
    /// When disabled, an unknown username is answered exactly like a wrong
    /// password.
    pub allow_implicit_registration: bool,
    /// On refresh, also verify the presented refresh token's signature,
    /// expiry, type and subject after it matched the stored value. When
    /// disabled, stored-value equality alone is trusted.
    pub validate_refresh_claims: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            allow_implicit_registration: true,
            validate_refresh_claims: true,
        }
    }
}

impl AuthConfig {
    /// Apply `JWT_SECRET`, `PASSWORD_PEPPER` and `ALLOW_IMPLICIT_REGISTRATION`
    /// from the process environment on top of this configuration
    pub fn with_env_overrides(self) -> Result<Self, String> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt.secret = secret;
        }

        if let Some(pepper) = lookup("PASSWORD_PEPPER") {
            self.password.pepper = Some(pepper);
        }

        if let Some(value) = lookup("ALLOW_IMPLICIT_REGISTRATION") {
            self.session.allow_implicit_registration = parse_bool(&value).ok_or_else(|| {
                format!("ALLOW_IMPLICIT_REGISTRATION must be a boolean, got {:?}", value)
            })?;
        }

        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.jwt.secret.is_empty() {
            errors.push("JWT secret must be set".to_string());
        } else if self.jwt.secret.len() < 32 {
            errors.push("JWT secret should be at least 256 bits (32 bytes)".to_string());
        }

        if self.jwt.access_token_lifetime.is_zero() {
            errors.push("Access token lifetime must be positive".to_string());
        }
        if self.jwt.refresh_token_lifetime < self.jwt.access_token_lifetime {
            errors.push("Refresh token lifetime must not be shorter than access token lifetime".to_string());
        }

        if let Err(e) = argon2::Params::new(
            self.password.memory_cost,
            self.password.time_cost,
            self.password.parallelism,
            Some(self.password.hash_length as usize),
        ) {
            errors.push(format!("Invalid Argon2 parameters: {}", e));
        }

        if self.password.max_password_length == 0 {
            errors.push("Maximum password length must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt.access_token_lifetime, Duration::from_secs(15 * 60));
        assert_eq!(config.jwt.refresh_token_lifetime, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.password.memory_cost, 19456);
        assert!(config.session.allow_implicit_registration);
        assert!(config.session.validate_refresh_claims);
    }

    #[test]
    fn test_config_validation_missing_secret() {
        let config = AuthConfig::default();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("JWT secret")));
    }

    #[test]
    fn test_config_validation_short_secret() {
        let mut config = AuthConfig::default();
        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_valid() {
        let mut config = AuthConfig::default();
        config.jwt.secret = "a".repeat(32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_argon_params() {
        let mut config = AuthConfig::default();
        config.jwt.secret = "a".repeat(32);
        config.password.parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations_parse_from_humantime() {
        let json = r#"{
            "jwt": { "secret": "s", "access_token_lifetime": "15m", "refresh_token_lifetime": "7days" }
        }"#;
        let config: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.jwt.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(config.jwt.refresh_token_lifetime, Duration::from_secs(604800));
        assert!(config.session.allow_implicit_registration);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_applied() {
        let config = AuthConfig::default()
            .with_overrides(env(&[
                ("JWT_SECRET", "from-the-environment"),
                ("PASSWORD_PEPPER", "pepper"),
                ("ALLOW_IMPLICIT_REGISTRATION", "no"),
            ]))
            .unwrap();

        assert_eq!(config.jwt.secret, "from-the-environment");
        assert_eq!(config.password.pepper.as_deref(), Some("pepper"));
        assert!(!config.session.allow_implicit_registration);
    }

    #[test]
    fn test_env_overrides_absent_keep_values() {
        let mut base = AuthConfig::default();
        base.jwt.secret = "from-file".to_string();

        let config = base.with_overrides(env(&[])).unwrap();
        assert_eq!(config.jwt.secret, "from-file");
        assert!(config.session.allow_implicit_registration);
    }

    #[test]
    fn test_env_override_rejects_unparseable_bool() {
        let err = AuthConfig::default()
            .with_overrides(env(&[("ALLOW_IMPLICIT_REGISTRATION", "maybe")]))
            .unwrap_err();
        assert!(err.contains("ALLOW_IMPLICIT_REGISTRATION"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
