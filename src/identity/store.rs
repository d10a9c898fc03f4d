//! Persistence contracts consumed by the identity service.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Account, Application};

/// Failures reported by the stores.
///
/// `AlreadyExists` and `NotFound` are the only conditions the service maps to
/// caller-facing outcomes; everything else is infrastructure failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new account and return its id.
    ///
    /// Email uniqueness must be enforced atomically; a duplicate reports
    /// `StoreError::AlreadyExists`.
    async fn create_account(&self, email: &str, password_hash: &str) -> Result<i64, StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Account, StoreError>;

    /// Administrator flag for an account; `false` when no role is recorded.
    /// An unknown account reports `StoreError::NotFound`.
    async fn find_role_flag(&self, account_id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ApplicationRegistry: Send + Sync {
    async fn find_application(&self, id: i32) -> Result<Application, StoreError>;
}
