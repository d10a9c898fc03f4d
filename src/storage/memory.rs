//! In-process credential store and application registry.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretSlice};
use tokio::sync::RwLock;

use crate::identity::{Account, Application, ApplicationRegistry, CredentialStore, StoreError};

struct AppRecord {
    name: String,
    secret: SecretSlice<u8>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    accounts: HashMap<i64, Account>,
    ids_by_email: HashMap<String, i64>,
    admins: HashMap<i64, bool>,
    apps: HashMap<i32, AppRecord>,
}

/// Keeps accounts, role flags and applications in memory.
///
/// Ids are assigned sequentially from 1. Email uniqueness is checked and the
/// account inserted under a single write lock.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an application and its signing secret.
    pub async fn insert_application(&self, id: i32, name: impl Into<String>, secret: Vec<u8>) {
        let record = AppRecord {
            name: name.into(),
            secret: SecretSlice::from(secret),
        };
        self.state.write().await.apps.insert(id, record);
    }

    /// Set the administrator flag for an existing account.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the account does not exist.
    pub async fn set_admin(&self, account_id: i64, is_admin: bool) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound);
        }
        state.admins.insert(account_id, is_admin);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn account_count(&self) -> usize {
        self.state.read().await.accounts.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_account(&self, email: &str, password_hash: &str) -> Result<i64, StoreError> {
        let mut state = self.state.write().await;
        if state.ids_by_email.contains_key(email) {
            return Err(StoreError::AlreadyExists);
        }

        state.next_id += 1;
        let id = state.next_id;
        state.ids_by_email.insert(email.to_string(), id);
        state.accounts.insert(
            id,
            Account {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(id)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account, StoreError> {
        let state = self.state.read().await;
        state
            .ids_by_email
            .get(email)
            .and_then(|id| state.accounts.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_role_flag(&self, account_id: i64) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        if !state.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound);
        }
        Ok(state.admins.get(&account_id).copied().unwrap_or(false))
    }
}

#[async_trait]
impl ApplicationRegistry for MemoryStore {
    async fn find_application(&self, id: i32) -> Result<Application, StoreError> {
        let state = self.state.read().await;
        let record = state.apps.get(&id).ok_or(StoreError::NotFound)?;
        Ok(Application::new(
            id,
            record.name.clone(),
            record.secret.expose_secret().to_vec(),
        ))
    }
}
