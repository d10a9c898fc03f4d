use secrecy::SecretString;

use crate::identity::IdentityConfig;

/// Settings shared by every subcommand.
#[derive(Clone)]
pub struct GlobalArgs {
    pub dsn: SecretString,
    pub config: IdentityConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(dsn: SecretString, config: IdentityConfig) -> Self {
        Self { dsn, config }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("dsn", &"***")
            .field("config", &self.config)
            .finish()
    }
}
