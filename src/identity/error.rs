use thiserror::Error;

/// Outcome kinds reported to callers of [`super::IdentityService`].
///
/// `Internal` displays as an opaque message; the wrapped source keeps the full
/// context chain for operator diagnostics.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account already exists")]
    AccountExists,
    #[error("application not found")]
    ApplicationNotFound,
    #[error("account not found")]
    AccountNotFound,
    #[error("internal error")]
    Internal {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl IdentityError {
    pub(crate) fn internal(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            operation,
            source: source.into().context(operation),
        }
    }

    /// Operation name recorded on internal failures.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Internal { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

/// Invalid service configuration, caught at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("token ttl must be positive")]
    TokenTtl,
    #[error("hash cost must be positive")]
    HashCost,
    #[error("invalid hash parameters: {0}")]
    HashParams(String),
}
