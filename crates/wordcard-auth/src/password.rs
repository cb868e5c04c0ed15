//! Password Service
//!
//! Argon2id hashing with a random per-password salt and an optional pepper.
//! Verification is constant-time inside the argon2 crate.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::config::PasswordConfig;
use crate::error::{AuthError, AuthResult};

/// Password service for hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    /// Create a new password service
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    fn peppered(&self, password: &str) -> Zeroizing<String> {
        match self.config.pepper {
            Some(ref pepper) => Zeroizing::new(format!("{}{}", password, pepper)),
            None => Zeroizing::new(password.to_string()),
        }
    }

    /// Reject input the hasher should never see
    pub fn check_length(&self, password: &str) -> AuthResult<()> {
        if password.len() > self.config.max_password_length {
            return Err(AuthError::PasswordTooLong);
        }
        Ok(())
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.check_length(password)?;

        let password = self.peppered(password);
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.hash_length as usize),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Invalid Argon2 parameters");
            AuthError::PasswordHashingFailed
        })?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                AuthError::PasswordHashingFailed
            })?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    ///
    /// `Ok(false)` means mismatch. An unparseable hash is an error, not a
    /// mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        if self.check_length(password).is_err() {
            return Ok(false);
        }

        let password = self.peppered(password);

        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = %e, "Stored password hash is unreadable");
            AuthError::PasswordHashingFailed
        })?;

        // Parameters are taken from the stored hash
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                tracing::error!(error = %e, "Password verification failed");
                Err(AuthError::PasswordHashingFailed)
            }
        }
    }
}
