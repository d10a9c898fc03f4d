//! Accounts and applications as handed over by the stores.

use secrecy::SecretSlice;

/// A registered credential holder.
///
/// The password hash is a PHC string and is redacted from `Debug` output.
#[derive(Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .finish()
    }
}

/// A calling application allowed to receive tokens.
pub struct Application {
    pub id: i32,
    pub name: String,
    pub secret: SecretSlice<u8>,
}

impl Application {
    #[must_use]
    pub fn new(id: i32, name: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            secret: SecretSlice::from(secret),
        }
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn debug_redacts_credentials() {
        let account = Account {
            id: 1,
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
        };
        let rendered = format!("{account:?}");
        assert!(rendered.contains("a@x.com"));
        assert!(!rendered.contains("argon2id"));

        let app = Application::new(7, "billing", b"top-secret".to_vec());
        let rendered = format!("{app:?}");
        assert!(rendered.contains("billing"));
        assert!(!rendered.contains("top-secret"));
        assert_eq!(app.secret.expose_secret(), b"top-secret");
    }
}
