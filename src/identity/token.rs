//! Application-scoped access tokens (HS256 JWT).
//!
//! Each token is signed with the secret of the application it was issued for,
//! so a token for one application never verifies under another's secret.

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use ulid::Ulid;

use super::models::{Account, Application};

type HmacSha256 = Hmac<Sha256>;

const ALG_HS256: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALG_HS256.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Account id.
    pub sub: String,
    pub email: String,
    /// Application id the token is scoped to.
    pub aud: String,
    pub app_id: i32,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("application signing secret is empty")]
    EmptySecret,
    #[error("invalid token ttl")]
    InvalidTtl,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid audience")]
    InvalidAudience,
    #[error("token expired")]
    Expired,
}

/// Mints signed tokens binding an account to an application.
pub trait TokenIssuer: Send + Sync {
    /// # Errors
    /// Returns `TokenError` if the claims cannot be encoded or signed.
    fn issue(
        &self,
        account: &Account,
        application: &Application,
        ttl: Duration,
    ) -> Result<String, TokenError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HmacTokenIssuer;

impl HmacTokenIssuer {
    /// Issue a token with an explicit issuance time.
    ///
    /// # Errors
    /// Returns `TokenError` if the ttl is not a whole number of seconds, the secret is
    /// empty, or encoding fails.
    pub fn issue_at(
        &self,
        account: &Account,
        application: &Application,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl_seconds = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidTtl)?;
        if ttl_seconds <= 0 || ttl.subsec_nanos() != 0 {
            return Err(TokenError::InvalidTtl);
        }
        let iat = now.timestamp();
        let exp = iat.checked_add(ttl_seconds).ok_or(TokenError::InvalidTtl)?;

        let claims = TokenClaims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            aud: application.id.to_string(),
            app_id: application.id,
            iat,
            exp,
            jti: Ulid::new().to_string(),
        };

        sign_hs256(application.secret.expose_secret(), &claims)
    }
}

impl TokenIssuer for HmacTokenIssuer {
    fn issue(
        &self,
        account: &Account,
        application: &Application,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(account, application, ttl, Utc::now())
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn mac(secret: &[u8]) -> Result<HmacSha256, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    HmacSha256::new_from_slice(secret).map_err(|_| TokenError::EmptySecret)
}

/// Sign `claims` as a compact HS256 JWT.
///
/// # Errors
/// Returns an error if the secret is empty or the claims cannot be encoded.
pub fn sign_hs256(secret: &[u8], claims: &TokenClaims) -> Result<String, TokenError> {
    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = mac(secret)?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 token and return its claims.
///
/// # Errors
///
/// Returns an error if:
/// - the token is malformed or contains invalid base64/json,
/// - the algorithm is not HS256,
/// - the signature does not match `secret`,
/// - `aud` differs from `expected_audience` or the token has expired at `now_unix_seconds`.
pub fn verify_hs256(
    token: &str,
    secret: &[u8],
    expected_audience: &str,
    now_unix_seconds: i64,
) -> Result<TokenClaims, TokenError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    if parts.next().is_some() {
        return Err(TokenError::TokenFormat);
    }

    let header: TokenHeader = b64d_json(header_b64)?;
    if header.alg != ALG_HS256 {
        return Err(TokenError::UnsupportedAlg(header.alg));
    }

    let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
    let mut mac = mac(secret)?;
    mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let claims: TokenClaims = b64d_json(claims_b64)?;
    if claims.aud != expected_audience {
        return Err(TokenError::InvalidAudience);
    }
    if claims.exp <= now_unix_seconds {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const NOW: i64 = 1_700_000_000;

    fn account() -> Account {
        Account {
            id: 1,
            email: "a@x.com".to_string(),
            password_hash: "unused".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).single().expect("valid timestamp")
    }

    #[test]
    fn issue_and_verify() -> Result<(), TokenError> {
        let app = Application::new(7, "billing", b"app-7-secret".to_vec());
        let token =
            HmacTokenIssuer.issue_at(&account(), &app, Duration::from_secs(3600), now())?;

        let claims = verify_hs256(&token, b"app-7-secret", "7", NOW)?;
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.aud, "7");
        assert_eq!(claims.app_id, 7);
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(Ulid::from_string(&claims.jti).is_ok());
        Ok(())
    }

    #[test]
    fn other_application_secret_fails() -> Result<(), TokenError> {
        let app_a = Application::new(7, "a", b"secret-a".to_vec());
        let token = HmacTokenIssuer.issue_at(&account(), &app_a, Duration::from_secs(60), now())?;

        let result = verify_hs256(&token, b"secret-b", "7", NOW);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_expired_or_wrong_aud() -> Result<(), TokenError> {
        let app = Application::new(7, "billing", b"k".to_vec());
        let token = HmacTokenIssuer.issue_at(&account(), &app, Duration::from_secs(120), now())?;

        let result = verify_hs256(&token, b"k", "8", NOW);
        assert!(matches!(result, Err(TokenError::InvalidAudience)));

        let result = verify_hs256(&token, b"k", "7", NOW + 120);
        assert!(matches!(result, Err(TokenError::Expired)));
        Ok(())
    }

    #[test]
    fn tampered_claims_fail() -> Result<(), TokenError> {
        let app = Application::new(7, "billing", b"k".to_vec());
        let token = HmacTokenIssuer.issue_at(&account(), &app, Duration::from_secs(120), now())?;
        let parts: Vec<&str> = token.split('.').collect();

        let mut claims: TokenClaims = b64d_json(parts[1])?;
        claims.sub = "2".to_string();
        let forged = format!("{}.{}.{}", parts[0], b64e_json(&claims)?, parts[2]);

        let result = verify_hs256(&forged, b"k", "7", NOW);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_empty_secret_and_zero_ttl() {
        let app = Application::new(7, "billing", Vec::new());
        let result = HmacTokenIssuer.issue_at(&account(), &app, Duration::from_secs(60), now());
        assert!(matches!(result, Err(TokenError::EmptySecret)));

        let app = Application::new(7, "billing", b"k".to_vec());
        let result = HmacTokenIssuer.issue_at(&account(), &app, Duration::ZERO, now());
        assert!(matches!(result, Err(TokenError::InvalidTtl)));

        let fractional = Duration::from_millis(1500);
        let result = HmacTokenIssuer.issue_at(&account(), &app, fractional, now());
        assert!(matches!(result, Err(TokenError::InvalidTtl)));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(
            verify_hs256("a.b", b"k", "7", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            verify_hs256("a.b.c.d", b"k", "7", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            verify_hs256("!!.b.c", b"k", "7", NOW),
            Err(TokenError::Base64)
        ));
    }

    #[test]
    fn rejects_other_algorithms() -> Result<(), TokenError> {
        let header = b64e_json(&TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })?;
        let token = format!("{header}.e30.");
        assert!(matches!(
            verify_hs256(&token, b"k", "7", NOW),
            Err(TokenError::UnsupportedAlg(alg)) if alg == "none"
        ));
        Ok(())
    }
}
