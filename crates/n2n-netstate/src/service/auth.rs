//! Throttled credential check for the login flow.

use crate::domain::types::ThrottleKey;
use crate::ports::CredentialVerifier;
use crate::service::throttle::{LockStatus, LoginThrottle};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Result of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    /// Wrong credentials, not yet locked
    Denied,
    /// Client or account is locked, or this failure locked it
    Locked { remaining: Duration },
}

pub struct AuthGate {
    throttle: Arc<LoginThrottle>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl AuthGate {
    pub fn new(throttle: Arc<LoginThrottle>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { throttle, verifier }
    }

    /// Check locks for the client then the account, verify, and record the
    /// outcome under both keys.
    ///
    /// A locked key short-circuits before the verifier runs, so a correct
    /// password does not unlock early.
    pub fn authenticate(
        &self,
        client: impl fmt::Display,
        account: &str,
        password: &str,
    ) -> AuthOutcome {
        let client_key = ThrottleKey::client(client);
        let account_key = ThrottleKey::account(account);

        for key in [&client_key, &account_key] {
            if let LockStatus::Locked { remaining } = self.throttle.check_lock(key) {
                warn!(key = %key, remaining_secs = remaining.as_secs(), "Login rejected, key locked");
                return AuthOutcome::Locked { remaining };
            }
        }

        if self.verifier.verify(account, password) {
            self.throttle.record_success(&client_key, &account_key);
            info!(client = %client_key, account, "Login granted");
            return AuthOutcome::Granted;
        }

        match self.throttle.record_failure(&client_key, &account_key) {
            LockStatus::Locked { remaining } => AuthOutcome::Locked { remaining },
            LockStatus::Unlocked => {
                warn!(client = %client_key, account, "Login denied");
                AuthOutcome::Denied
            }
        }
    }

    pub fn throttle(&self) -> &Arc<LoginThrottle> {
        &self.throttle
    }
}
