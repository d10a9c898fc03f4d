use std::time::Duration;

use super::error::ConfigError;

pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 60 * 60;
pub const DEFAULT_HASH_COST: u32 = 2;
pub const DEFAULT_HASH_MEMORY_KIB: u32 = argon2::Params::DEFAULT_M_COST;

/// Settings the identity service needs; validated once by [`IdentityConfig::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityConfig {
    token_ttl: Duration,
    hash_cost: u32,
    hash_memory_kib: u32,
}

impl IdentityConfig {
    /// # Errors
    /// Returns `ConfigError` if the ttl is not a positive whole number of
    /// seconds or the hash cost is zero.
    pub fn new(token_ttl: Duration, hash_cost: u32) -> Result<Self, ConfigError> {
        // Tokens carry second-resolution `exp`; fractions would be truncated.
        if token_ttl.as_secs() == 0
            || token_ttl.subsec_nanos() != 0
            || i64::try_from(token_ttl.as_secs()).is_err()
        {
            return Err(ConfigError::TokenTtl);
        }
        if hash_cost == 0 {
            return Err(ConfigError::HashCost);
        }
        Ok(Self {
            token_ttl,
            hash_cost,
            hash_memory_kib: DEFAULT_HASH_MEMORY_KIB,
        })
    }

    /// Build from a signed seconds value as read from the command line.
    ///
    /// # Errors
    /// Returns `ConfigError::TokenTtl` for zero or negative values.
    pub fn from_ttl_seconds(ttl_seconds: i64, hash_cost: u32) -> Result<Self, ConfigError> {
        let seconds = u64::try_from(ttl_seconds).map_err(|_| ConfigError::TokenTtl)?;
        Self::new(Duration::from_secs(seconds), hash_cost)
    }

    #[must_use]
    pub fn with_hash_memory_kib(mut self, kib: u32) -> Self {
        self.hash_memory_kib = kib;
        self
    }

    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    #[must_use]
    pub const fn hash_cost(&self) -> u32 {
        self.hash_cost
    }

    #[must_use]
    pub const fn hash_memory_kib(&self) -> u32 {
        self.hash_memory_kib
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS),
            hash_cost: DEFAULT_HASH_COST,
            hash_memory_kib: DEFAULT_HASH_MEMORY_KIB,
        }
    }
}
