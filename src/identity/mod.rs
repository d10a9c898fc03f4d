//! Credential verification and application-scoped token issuance.
//!
//! Flow Overview:
//! 1) `register` hashes the password (argon2id) and hands it to the credential store.
//! 2) `login` looks up the account, verifies the password, resolves the calling
//!    application and signs a token with that application's secret.
//! 3) `is_admin` reads the administrator flag from the credential store.
//!
//! Unknown emails and wrong passwords both surface as `InvalidCredentials`, and
//! both paths perform one password verification.

mod config;
mod error;
mod models;
mod password;
mod service;
mod store;
mod token;


pub use config::{
    DEFAULT_HASH_COST, DEFAULT_HASH_MEMORY_KIB, DEFAULT_TOKEN_TTL_SECONDS, IdentityConfig,
};
pub use error::{ConfigError, IdentityError};
pub use models::{Account, Application};
pub use password::{PasswordError, PasswordHasher};
pub use service::IdentityService;
pub use store::{ApplicationRegistry, CredentialStore, StoreError};
pub use token::{
    HmacTokenIssuer, TokenClaims, TokenError, TokenHeader, TokenIssuer, sign_hs256, verify_hs256,
};
