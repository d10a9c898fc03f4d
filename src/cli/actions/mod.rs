pub mod admin;
pub mod login;
pub mod register;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::cli::globals::GlobalArgs;
use crate::identity::{HmacTokenIssuer, IdentityError, IdentityService};
use crate::storage::PgStore;

pub type PgIdentityService = IdentityService<PgStore, PgStore, HmacTokenIssuer>;

#[derive(Debug)]
pub enum Action {
    Register(register::Args),
    Login(login::Args),
    IsAdmin(admin::Args),
}

impl Action {
    /// Run the action against the configured database and print its result.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the operation fails.
    pub async fn execute(self) -> Result<()> {
        match self {
            Self::Register(args) => register::handle(args).await,
            Self::Login(args) => login::handle(args).await,
            Self::IsAdmin(args) => admin::handle(args).await,
        }
    }
}

async fn service(globals: &GlobalArgs) -> Result<PgIdentityService> {
    let store = Arc::new(PgStore::connect(&globals.dsn).await?);
    let service = IdentityService::new(
        &globals.config,
        Arc::clone(&store),
        store,
        HmacTokenIssuer,
    )?;
    Ok(service)
}

/// Convert a service error for the terminal, keeping internal detail in the logs.
fn report(err: IdentityError) -> anyhow::Error {
    if let IdentityError::Internal { operation, source } = &err {
        debug!(operation, error = format!("{source:#}"), "internal failure");
    }
    anyhow!(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_hides_internal_detail() {
        let err = report(IdentityError::Internal {
            operation: "identity.login",
            source: anyhow!("password authentication failed for user \"svc\""),
        });
        assert_eq!(format!("{err:#}"), "internal error");

        let err = report(IdentityError::InvalidCredentials);
        assert_eq!(err.to_string(), "invalid credentials");
    }
}
