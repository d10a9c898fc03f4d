//! Argon2id password hashing.
//!
//! Hashes are PHC strings, so the algorithm, cost and salt travel with the
//! hash and verification does not depend on the current configuration.

use argon2::password_hash::{Error as PhcError, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use rand::RngCore;
use thiserror::Error;

use super::config::IdentityConfig;
use super::error::ConfigError;

const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(PhcError),
    #[error("malformed password hash")]
    Malformed,
}

#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// # Errors
    /// Returns `ConfigError::HashParams` if argon2 rejects the cost or memory setting.
    pub fn new(config: &IdentityConfig) -> Result<Self, ConfigError> {
        let params = Params::new(config.hash_memory_kib(), config.hash_cost(), 1, None)
            .map_err(|e| ConfigError::HashParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Produce a salted PHC hash of `password`.
    ///
    /// # Errors
    /// Returns `PasswordError::Hash` if salt encoding or hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordError::Hash)?;

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(PasswordError::Hash)
    }

    /// Check `password` against a stored PHC hash.
    ///
    /// `Ok(false)` means the password does not match.
    ///
    /// # Errors
    /// Returns `PasswordError::Malformed` if the stored hash cannot be parsed or used.
    pub fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::Malformed)?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(_) => Err(PasswordError::Malformed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn hasher() -> PasswordHasher {
        let config = IdentityConfig::new(Duration::from_secs(60), 1)
            .map(|c| c.with_hash_memory_kib(1024))
            .expect("valid config");
        PasswordHasher::new(&config).expect("valid params")
    }

    #[test]
    fn hash_then_verify() -> Result<(), PasswordError> {
        let hasher = hasher();
        let hash = hasher.hash("secret123")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret123"));
        assert!(hasher.verify(&hash, "secret123")?);
        assert!(!hasher.verify(&hash, "wrong")?);
        Ok(())
    }

    #[test]
    fn salts_differ() -> Result<(), PasswordError> {
        let hasher = hasher();
        assert_ne!(hasher.hash("same")?, hasher.hash("same")?);
        Ok(())
    }

    #[test]
    fn malformed_hash_is_distinct_from_mismatch() {
        let hasher = hasher();
        assert!(matches!(
            hasher.verify("not-a-phc-string", "secret123"),
            Err(PasswordError::Malformed)
        ));
    }

    #[test]
    fn rejects_memory_below_argon2_minimum() {
        let config = IdentityConfig::new(Duration::from_secs(60), 1)
            .map(|c| c.with_hash_memory_kib(1))
            .expect("valid config");
        assert!(matches!(
            PasswordHasher::new(&config),
            Err(ConfigError::HashParams(_))
        ));
    }
}
