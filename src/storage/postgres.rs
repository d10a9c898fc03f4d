//! Postgres-backed credential store and application registry.
//!
//! Expects the tables from `sql/schema.sql`. Email uniqueness is enforced by
//! the `users.email` unique constraint; a violation maps to
//! `StoreError::AlreadyExists`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use tracing::Instrument;

use crate::identity::{Account, Application, ApplicationRegistry, CredentialStore, StoreError};

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(test)]
const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &SecretString) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(dsn.expose_secret())
            .await
            .context("failed to connect to database")?;
        Ok(Self::new(pool))
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn account_from_row(row: &PgRow) -> anyhow::Result<Account> {
    Ok(Account {
        id: row.try_get("id").context("failed to decode users.id")?,
        email: row.try_get("email").context("failed to decode users.email")?,
        password_hash: row
            .try_get("pass_hash")
            .context("failed to decode users.pass_hash")?,
    })
}

fn application_from_row(row: &PgRow) -> anyhow::Result<Application> {
    Ok(Application::new(
        row.try_get("id").context("failed to decode apps.id")?,
        row.try_get::<String, _>("name")
            .context("failed to decode apps.name")?,
        row.try_get::<Vec<u8>, _>("secret")
            .context("failed to decode apps.secret")?,
    ))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create_account(&self, email: &str, password_hash: &str) -> Result<i64, StoreError> {
        let query = r"
            INSERT INTO users (email, pass_hash)
            VALUES ($1, $2)
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(row
                .try_get("id")
                .context("failed to decode inserted user id")?),
            Err(err) if is_unique_violation(&err) => Err(StoreError::AlreadyExists),
            Err(err) => Err(StoreError::Other(
                anyhow::Error::new(err).context("failed to insert user"),
            )),
        }
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account, StoreError> {
        let query = "SELECT id, email, pass_hash FROM users WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;

        let row = row.ok_or(StoreError::NotFound)?;
        Ok(account_from_row(&row)?)
    }

    async fn find_role_flag(&self, account_id: i64) -> Result<bool, StoreError> {
        let query = r"
            SELECT COALESCE(r.is_admin, FALSE) AS is_admin
            FROM users u
            LEFT JOIN roles r ON r.user_id = u.id
            WHERE u.id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user role")?;

        let row = row.ok_or(StoreError::NotFound)?;
        Ok(row
            .try_get::<bool, _>("is_admin")
            .context("failed to decode role flag")?)
    }
}

#[async_trait]
impl ApplicationRegistry for PgStore {
    async fn find_application(&self, id: i32) -> Result<Application, StoreError> {
        let query = "SELECT id, name, secret FROM apps WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup application")?;

        let row = row.ok_or(StoreError::NotFound)?;
        Ok(application_from_row(&row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use secrecy::ExposeSecret;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;
    use tokio::sync::Mutex;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    static TEST_MUTEX: Mutex<()> = Mutex::const_new(());

    // Runs against a live database only when IDENTITY_TEST_DSN is set.
    async fn test_store() -> Result<Option<PgStore>> {
        let Ok(dsn) = std::env::var("IDENTITY_TEST_DSN") else {
            eprintln!("Skipping integration test: IDENTITY_TEST_DSN not set");
            return Ok(None);
        };

        let store = PgStore::connect(&SecretString::from(dsn)).await?;
        sqlx::Executor::execute(store.pool(), SCHEMA_SQL)
            .await
            .context("failed to execute schema SQL")?;
        sqlx::query("TRUNCATE users, roles, apps RESTART IDENTITY CASCADE")
            .execute(store.pool())
            .await?;
        Ok(Some(store))
    }

    #[tokio::test]
    async fn accounts_and_roles() -> Result<()> {
        let _guard = TEST_MUTEX.lock().await;
        let Some(store) = test_store().await? else {
            return Ok(());
        };

        let id = store.create_account("a@x.com", "hash-a").await?;
        let duplicate = store.create_account("a@x.com", "hash-b").await;
        assert!(matches!(duplicate, Err(StoreError::AlreadyExists)));

        let account = store.find_account_by_email("a@x.com").await?;
        assert_eq!(account.id, id);
        assert_eq!(account.password_hash, "hash-a");
        assert!(matches!(
            store.find_account_by_email("missing@x.com").await,
            Err(StoreError::NotFound)
        ));

        assert!(!store.find_role_flag(id).await?);
        sqlx::query("INSERT INTO roles (user_id, is_admin) VALUES ($1, TRUE)")
            .bind(id)
            .execute(store.pool())
            .await?;
        assert!(store.find_role_flag(id).await?);
        assert!(matches!(
            store.find_role_flag(id + 1000).await,
            Err(StoreError::NotFound)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn applications() -> Result<()> {
        let _guard = TEST_MUTEX.lock().await;
        let Some(store) = test_store().await? else {
            return Ok(());
        };

        sqlx::query("INSERT INTO apps (id, name, secret) VALUES ($1, $2, $3)")
            .bind(7_i32)
            .bind("billing")
            .bind(b"app-7-secret".to_vec())
            .execute(store.pool())
            .await?;

        let app = store.find_application(7).await?;
        assert_eq!(app.id, 7);
        assert_eq!(app.name, "billing");
        assert_eq!(app.secret.expose_secret(), b"app-7-secret");
        assert!(matches!(
            store.find_application(999).await,
            Err(StoreError::NotFound)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn mistyped_columns_are_errors() -> Result<()> {
        let _guard = TEST_MUTEX.lock().await;
        let Some(store) = test_store().await? else {
            return Ok(());
        };

        let query = "SELECT 'one'::TEXT AS id, 'a@x.com'::TEXT AS email, NULL::TEXT AS pass_hash";
        let row = sqlx::query(query).fetch_one(store.pool()).await?;
        assert!(account_from_row(&row).is_err());

        let query = "SELECT 7::INTEGER AS id, 'billing'::TEXT AS name, 42::INTEGER AS secret";
        let row = sqlx::query(query).fetch_one(store.pool()).await?;
        assert!(application_from_row(&row).is_err());
        Ok(())
    }
}
