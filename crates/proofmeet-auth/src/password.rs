//! Password service
//!
//! Argon2id hashing with OWASP-guideline parameters. The service both
//! hashes new passwords (fixture seeding, account tooling) and re-verifies
//! a stored hash when a participant signs their Court Card.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::{AuthError, AuthResult};

/// Argon2id parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub hash_length: u32,
    pub min_password_length: usize,
    /// Optional site-wide pepper mixed into every hash
    pub pepper: Option<String>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP-recommended Argon2id settings
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            min_password_length: 8,
            pepper: None,
        }
    }
}

/// Password hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        if password.len() < self.config.min_password_length {
            return Err(AuthError::WeakPassword(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        let peppered = self.apply_pepper(password);
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.hash_length as usize),
        )
        .map_err(|e| AuthError::Internal(format!("invalid Argon2 params: {e}")))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);
        let hash = argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::PasswordHashingFailed)?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let peppered = self.apply_pepper(password);
        let parsed_hash =
            PasswordHash::new(hash).map_err(|_| AuthError::PasswordVerificationFailed)?;

        let argon2 = Argon2::default();
        match argon2.verify_password(peppered.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(AuthError::PasswordVerificationFailed),
        }
    }

    fn apply_pepper(&self, password: &str) -> Zeroizing<String> {
        match &self.config.pepper {
            Some(pepper) => Zeroizing::new(format!("{password}{pepper}")),
            None => Zeroizing::new(password.to_string()),
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}
