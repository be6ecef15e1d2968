//! Single admin account checked against an Argon2 password hash.
//!
//! `auth.password_hash` holds a PHC string (`$argon2id$v=19$m=...`). The
//! salt and cost parameters travel inside the string, so verification uses
//! whatever the hash was created with.

use crate::domain::config::AuthConfig;
use crate::ports::CredentialVerifier;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use subtle::ConstantTimeEq;
use tracing::warn;

#[derive(Clone)]
pub struct StaticCredentials {
    username: String,
    password_hash: Option<String>,
}

impl StaticCredentials {
    /// Build from config. A missing or malformed hash disables login.
    pub fn from_config(config: &AuthConfig) -> Self {
        let password_hash = match config.password_hash.as_deref().map(str::trim) {
            None | Some("") => {
                warn!("No admin password hash configured, every login will be rejected");
                None
            }
            Some(encoded) => match PasswordHash::new(encoded) {
                Ok(_) => Some(encoded.to_string()),
                Err(e) => {
                    warn!(error = %e, "auth.password_hash is not a valid PHC string, every login will be rejected");
                    None
                }
            },
        };

        Self {
            username: config.username.clone(),
            password_hash,
        }
    }

    /// Argon2id hash of `password` with a random salt, in the form
    /// `auth.password_hash` expects.
    pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("username", &self.username)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, account: &str, password: &str) -> bool {
        let Some(encoded) = self.password_hash.as_deref() else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(encoded) else {
            return false;
        };

        // always run the hash so a wrong account costs the same as a wrong password
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        let account_ok: bool = account.as_bytes().ct_eq(self.username.as_bytes()).into();

        password_ok && account_ok
    }
}
