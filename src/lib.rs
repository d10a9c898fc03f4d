//! # Identity
//!
//! Registers account credentials, authenticates them, and issues bearer tokens
//! scoped to the calling application.
//!
//! ## Authentication
//!
//! Passwords are stored as argon2id PHC hashes. A login with an unknown email
//! and a login with a wrong password fail identically (`InvalidCredentials`),
//! and both perform one password verification.
//!
//! ## Tokens
//!
//! Tokens are HS256 JWTs signed with the secret of the application they were
//! issued for. The audience is the application id, and the expiry is the
//! configured TTL after issuance. Tokens are never stored.
//!
//! ## Authorization
//!
//! `is_admin` reads a store-managed administrator flag. An unknown account is
//! an error, never a silent `false`.

pub mod cli;
pub mod identity;
pub mod storage;

pub use identity::{IdentityConfig, IdentityError, IdentityService};
