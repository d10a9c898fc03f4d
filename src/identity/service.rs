use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info, instrument, warn};

use super::config::IdentityConfig;
use super::error::{ConfigError, IdentityError};
use super::password::{PasswordError, PasswordHasher};
use super::store::{ApplicationRegistry, CredentialStore, StoreError};
use super::token::TokenIssuer;

// Hashed once at construction and verified against when an email is unknown,
// so both failure paths pay for one password verification.
const DUMMY_PASSWORD: &str = "identity-dummy-password";

/// Registration, login and admin checks over injected collaborators.
///
/// The service holds no mutable state; every call is an independent, serial
/// sequence of collaborator requests. Dropping a call's future (for example
/// through `tokio::time::timeout`) abandons any in-flight store request.
pub struct IdentityService<S: ?Sized, A: ?Sized, T> {
    credentials: Arc<S>,
    applications: Arc<A>,
    tokens: T,
    hasher: PasswordHasher,
    token_ttl: Duration,
    dummy_hash: Arc<str>,
}

impl<S, A, T> IdentityService<S, A, T>
where
    S: CredentialStore + ?Sized,
    A: ApplicationRegistry + ?Sized,
    T: TokenIssuer,
{
    /// # Errors
    /// Returns `ConfigError` if the hashing parameters are rejected.
    pub fn new(
        config: &IdentityConfig,
        credentials: Arc<S>,
        applications: Arc<A>,
        tokens: T,
    ) -> Result<Self, ConfigError> {
        let hasher = PasswordHasher::new(config)?;
        let dummy_hash = hasher
            .hash(DUMMY_PASSWORD)
            .map_err(|e| ConfigError::HashParams(e.to_string()))?;

        Ok(Self {
            credentials,
            applications,
            tokens,
            hasher,
            token_ttl: config.token_ttl(),
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Register a new account and return its id.
    ///
    /// # Errors
    /// `AccountExists` when the email is taken, `Internal` on hashing or store failure.
    #[instrument(name = "identity.register", skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<i64, IdentityError> {
        const OPERATION: &str = "identity.register";

        info!("registering user");

        let hash = self.hash_password(password).await.map_err(|e| {
            error!(error = %e, "failed to generate password hash");
            IdentityError::internal(OPERATION, e)
        })?;

        match self.credentials.create_account(email, &hash).await {
            Ok(id) => {
                info!(account_id = id, "user registered");
                Ok(id)
            }
            Err(StoreError::AlreadyExists) => {
                warn!("account already exists");
                Err(IdentityError::AccountExists)
            }
            Err(e) => {
                error!(error = %e, "failed to save user");
                Err(IdentityError::internal(OPERATION, e))
            }
        }
    }

    /// Authenticate and mint a token scoped to `app_id`.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown email or wrong password,
    /// `ApplicationNotFound` for an unknown application, `Internal` otherwise.
    #[instrument(name = "identity.login", skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        app_id: i32,
    ) -> Result<String, IdentityError> {
        const OPERATION: &str = "identity.login";

        info!("attempting to login user");

        let account = match self.credentials.find_account_by_email(email).await {
            Ok(account) => Some(account),
            Err(StoreError::NotFound) => None,
            Err(e) => {
                error!(error = %e, "failed to get user");
                return Err(IdentityError::internal(OPERATION, e));
            }
        };

        let stored_hash = account
            .as_ref()
            .map_or_else(|| self.dummy_hash.to_string(), |a| a.password_hash.clone());
        let verified = self
            .verify_password(stored_hash, password)
            .await
            .map_err(|e| IdentityError::internal(OPERATION, e))?;

        let Some(account) = account else {
            warn!("user not found");
            return Err(IdentityError::InvalidCredentials);
        };

        match verified {
            Ok(true) => {}
            Ok(false) => {
                info!("invalid credentials");
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => {
                warn!(account_id = account.id, error = %e, "stored password hash rejected");
                return Err(IdentityError::InvalidCredentials);
            }
        }

        let application = match self.applications.find_application(app_id).await {
            Ok(application) => application,
            Err(StoreError::NotFound) => {
                warn!("application not found");
                return Err(IdentityError::ApplicationNotFound);
            }
            Err(e) => {
                error!(error = %e, "failed to get application");
                return Err(IdentityError::internal(OPERATION, e));
            }
        };

        let token = self
            .tokens
            .issue(&account, &application, self.token_ttl)
            .map_err(|e| {
                error!(error = %e, "failed to generate token");
                IdentityError::internal(OPERATION, e)
            })?;

        info!(account_id = account.id, "user logged in successfully");

        Ok(token)
    }

    /// Whether the account carries the administrator flag.
    ///
    /// # Errors
    /// `AccountNotFound` for an unknown id, `Internal` on store failure.
    #[instrument(name = "identity.is_admin", skip(self))]
    pub async fn is_admin(&self, account_id: i64) -> Result<bool, IdentityError> {
        const OPERATION: &str = "identity.is_admin";

        info!("checking if user is admin");

        match self.credentials.find_role_flag(account_id).await {
            Ok(is_admin) => {
                info!(is_admin, "checked if user is admin");
                Ok(is_admin)
            }
            Err(StoreError::NotFound) => {
                warn!("user not found");
                Err(IdentityError::AccountNotFound)
            }
            Err(e) => {
                error!(error = %e, "failed to check admin flag");
                Err(IdentityError::internal(OPERATION, e))
            }
        }
    }

    async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let hasher = self.hasher.clone();
        let password = SecretString::from(password.to_owned());
        let hash = tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
            .await
            .context("password hashing task failed")??;
        Ok(hash)
    }

    async fn verify_password(
        &self,
        hash: String,
        password: &str,
    ) -> anyhow::Result<Result<bool, PasswordError>> {
        let hasher = self.hasher.clone();
        let password = SecretString::from(password.to_owned());
        tokio::task::spawn_blocking(move || hasher.verify(&hash, password.expose_secret()))
            .await
            .context("password verification task failed")
    }
}
