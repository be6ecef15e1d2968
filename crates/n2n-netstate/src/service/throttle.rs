//! Failed-login throttle keyed by client address and by account.
//!
//! Memory is bounded two ways: an emergency eviction on insert when the
//! table is full, and a periodic sweep of long-idle entries.

use crate::domain::config::LoginConfig;
use crate::domain::types::{LoginAttempt, ThrottleKey, Timestamp};
use crate::metrics;
use crate::ports::TimeSource;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Lock state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    Locked { remaining: Duration },
}

impl LockStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockStatus::Locked { .. })
    }

    /// Remaining lock time, zero when unlocked.
    pub fn remaining(&self) -> Duration {
        match self {
            LockStatus::Locked { remaining } => *remaining,
            LockStatus::Unlocked => Duration::ZERO,
        }
    }
}

/// Login throttle state shared across requests
pub struct LoginThrottle {
    attempts: Mutex<HashMap<ThrottleKey, LoginAttempt>>,
    config: LoginConfig,
    clock: Arc<dyn TimeSource>,
}

impl LoginThrottle {
    pub fn new(config: LoginConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Current lock state of `key`.
    ///
    /// A lock that has run out resets the failure counter; the record itself
    /// stays until swept or evicted.
    pub fn check_lock(&self, key: &ThrottleKey) -> LockStatus {
        let now = self.clock.now();
        let mut attempts = self.attempts.lock();

        let Some(attempt) = attempts.get_mut(key) else {
            return LockStatus::Unlocked;
        };

        match attempt.locked_until {
            Some(until) if now < until => LockStatus::Locked {
                remaining: until.duration_since(now),
            },
            Some(_) => {
                debug!(key = %key, "Lock expired, resetting failure count");
                attempt.failure_count = 0;
                attempt.locked_until = None;
                LockStatus::Unlocked
            }
            None => LockStatus::Unlocked,
        }
    }

    /// Count one failure under both keys. Locked if either key reached the
    /// threshold with this failure.
    pub fn record_failure(&self, client: &ThrottleKey, account: &ThrottleKey) -> LockStatus {
        let now = self.clock.now();
        let mut attempts = self.attempts.lock();
        let mut status = LockStatus::Unlocked;

        metrics::record_login_failure();

        for key in [client, account] {
            if !attempts.contains_key(key) {
                self.make_room(&mut attempts, now, &[client, account]);
            }

            let attempt = attempts
                .entry(key.clone())
                .or_insert_with(|| LoginAttempt::new(now));
            attempt.failure_count = attempt.failure_count.saturating_add(1);
            attempt.last_failure = now;

            if attempt.failure_count >= self.config.max_attempts {
                attempt.locked_until = Some(now.saturating_add(self.config.lock_duration));
                status = LockStatus::Locked {
                    remaining: self.config.lock_duration,
                };
                metrics::record_login_lockout();
                warn!(
                    key = %key,
                    failures = attempt.failure_count,
                    lock_secs = self.config.lock_duration.as_secs(),
                    "Login locked"
                );
            }
        }

        metrics::set_login_tracked_keys(attempts.len());
        status
    }

    /// Forget both keys entirely.
    pub fn record_success(&self, client: &ThrottleKey, account: &ThrottleKey) {
        let mut attempts = self.attempts.lock();
        attempts.remove(client);
        attempts.remove(account);
        metrics::set_login_tracked_keys(attempts.len());
    }

    /// Failures currently counted for `key`.
    pub fn failure_count(&self, key: &ThrottleKey) -> u32 {
        self.attempts
            .lock()
            .get(key)
            .map(|a| a.failure_count)
            .unwrap_or(0)
    }

    /// Drop entries that are unlocked and idle past the record expiry.
    /// Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let expiry = self.config.record_expiry;
        let mut attempts = self.attempts.lock();

        let before = attempts.len();
        attempts.retain(|_, attempt| !attempt.is_stale(now, expiry));
        let removed = before - attempts.len();

        if removed > 0 {
            debug!(removed, remaining = attempts.len(), "Swept login throttle");
            metrics::record_login_evictions("sweep", removed);
        }
        metrics::set_login_tracked_keys(attempts.len());
        removed
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.attempts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.lock().is_empty()
    }

    /// Free at least one slot: idle entries first, then oldest by last
    /// failure. Keys in `protected` are never evicted.
    fn make_room(
        &self,
        attempts: &mut HashMap<ThrottleKey, LoginAttempt>,
        now: Timestamp,
        protected: &[&ThrottleKey],
    ) {
        let cap = self.config.max_records;
        if attempts.len() < cap {
            return;
        }

        let before = attempts.len();
        let idle = self.config.overflow_idle;
        attempts.retain(|key, attempt| protected.contains(&key) || !attempt.is_stale(now, idle));
        let idle_evicted = before - attempts.len();

        let mut oldest_evicted = 0;
        while attempts.len() >= cap {
            let oldest = attempts
                .iter()
                .filter(|(key, _)| !protected.contains(key))
                .min_by_key(|(_, attempt)| attempt.last_failure)
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    attempts.remove(&key);
                    oldest_evicted += 1;
                }
                None => break,
            }
        }

        metrics::record_login_evictions("idle", idle_evicted);
        metrics::record_login_evictions("oldest", oldest_evicted);
        warn!(
            cap,
            idle_evicted, oldest_evicted, "Login throttle full, evicted entries"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ManualTimeSource;

    fn throttle_with(config: LoginConfig) -> (LoginThrottle, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(1_000_000));
        (LoginThrottle::new(config, clock.clone()), clock)
    }

    fn keys() -> (ThrottleKey, ThrottleKey) {
        (ThrottleKey::client("203.0.113.9"), ThrottleKey::account("admin"))
    }

    #[test]
    fn test_locks_at_threshold() {
        let (throttle, _) = throttle_with(LoginConfig::default());
        let (client, account) = keys();

        for _ in 0..4 {
            assert_eq!(throttle.record_failure(&client, &account), LockStatus::Unlocked);
        }
        let status = throttle.record_failure(&client, &account);
        assert_eq!(
            status,
            LockStatus::Locked {
                remaining: Duration::from_secs(900)
            }
        );

        let check = throttle.check_lock(&client);
        assert!(check.is_locked());
        assert_eq!(check.remaining(), Duration::from_secs(900));
        assert!(throttle.check_lock(&account).is_locked());
    }

    #[test]
    fn test_lock_expires_and_counter_resets() {
        let (throttle, clock) = throttle_with(LoginConfig::default());
        let (client, account) = keys();
        for _ in 0..5 {
            throttle.record_failure(&client, &account);
        }

        clock.advance(Duration::from_secs(600));
        assert_eq!(
            throttle.check_lock(&client).remaining(),
            Duration::from_secs(300)
        );

        clock.advance(Duration::from_secs(300));
        assert_eq!(throttle.check_lock(&client), LockStatus::Unlocked);
        assert_eq!(throttle.failure_count(&client), 0);
        // record survives the reset
        assert_eq!(throttle.len(), 2);
    }

    #[test]
    fn test_check_lock_does_not_reset_unlocked_counter() {
        let (throttle, _) = throttle_with(LoginConfig::default());
        let (client, account) = keys();
        throttle.record_failure(&client, &account);
        throttle.record_failure(&client, &account);

        assert_eq!(throttle.check_lock(&client), LockStatus::Unlocked);
        assert_eq!(throttle.failure_count(&client), 2);
    }

    #[test]
    fn test_account_key_locks_across_clients() {
        let (throttle, _) = throttle_with(LoginConfig::default());
        let account = ThrottleKey::account("admin");

        let mut last = LockStatus::Unlocked;
        for i in 0..5 {
            last = throttle.record_failure(&ThrottleKey::client(format!("198.51.100.{i}")), &account);
        }
        assert!(last.is_locked());
        assert!(throttle.check_lock(&account).is_locked());
        assert!(!throttle.check_lock(&ThrottleKey::client("198.51.100.0")).is_locked());
    }

    #[test]
    fn test_success_clears_both_keys() {
        let (throttle, _) = throttle_with(LoginConfig::default());
        let (client, account) = keys();
        for _ in 0..5 {
            throttle.record_failure(&client, &account);
        }

        throttle.record_success(&client, &account);
        assert_eq!(throttle.check_lock(&client), LockStatus::Unlocked);
        assert_eq!(throttle.check_lock(&account), LockStatus::Unlocked);
        assert_eq!(throttle.failure_count(&client), 0);
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_cap_never_exceeded() {
        let config = LoginConfig {
            max_records: 100,
            ..LoginConfig::default()
        };
        let (throttle, clock) = throttle_with(config);
        let account = ThrottleKey::account("admin");

        for i in 0..150 {
            clock.advance(Duration::from_millis(10));
            throttle.record_failure(&ThrottleKey::client(format!("client-{i}")), &account);
            assert!(throttle.len() <= 100);
        }
        // the account being attacked is never the eviction victim
        assert!(throttle.check_lock(&account).is_locked());
    }

    #[test]
    fn test_overflow_evicts_oldest_first() {
        let config = LoginConfig {
            max_records: 4,
            ..LoginConfig::default()
        };
        let (throttle, clock) = throttle_with(config);
        let a = ThrottleKey::client("a");
        let b = ThrottleKey::client("b");
        let c = ThrottleKey::client("c");
        let account = ThrottleKey::account("x");

        throttle.record_failure(&a, &account);
        clock.advance(Duration::from_secs(1));
        throttle.record_failure(&b, &account);
        clock.advance(Duration::from_secs(1));
        throttle.record_failure(&c, &account);
        assert_eq!(throttle.len(), 4);

        clock.advance(Duration::from_secs(1));
        throttle.record_failure(&ThrottleKey::client("d"), &account);
        assert_eq!(throttle.len(), 4);
        assert_eq!(throttle.failure_count(&a), 0);
        assert_eq!(throttle.failure_count(&b), 1);
    }

    #[test]
    fn test_overflow_prefers_idle_entries() {
        let config = LoginConfig {
            max_records: 4,
            ..LoginConfig::default()
        };
        let (throttle, clock) = throttle_with(config);
        let account = ThrottleKey::account("x");

        throttle.record_failure(&ThrottleKey::client("old-1"), &account);
        throttle.record_failure(&ThrottleKey::client("old-2"), &account);
        clock.advance(Duration::from_secs(6 * 60));
        throttle.record_failure(&ThrottleKey::client("fresh"), &account);
        assert_eq!(throttle.len(), 4);

        throttle.record_failure(&ThrottleKey::client("new"), &account);
        // both idle entries went in the first pass
        assert_eq!(throttle.len(), 3);
        assert_eq!(throttle.failure_count(&ThrottleKey::client("fresh")), 1);
    }

    #[test]
    fn test_sweep_purges_expired_idle_entries() {
        let (throttle, clock) = throttle_with(LoginConfig::default());
        let locked = ThrottleKey::client("locked");
        let idle = ThrottleKey::client("idle");
        let account = ThrottleKey::account("a");
        let other = ThrottleKey::account("b");

        throttle.record_failure(&idle, &other);
        for _ in 0..5 {
            throttle.record_failure(&locked, &account);
        }

        clock.advance(Duration::from_secs(61 * 60));
        // lock is 15m, so everything is past its lock and idle for over an hour
        assert_eq!(throttle.sweep(), 4);
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_sweep_ignores_recent_failures() {
        let (throttle, clock) = throttle_with(LoginConfig::default());
        let (client, account) = keys();
        throttle.record_failure(&client, &account);

        clock.advance(Duration::from_secs(30 * 60));
        assert_eq!(throttle.sweep(), 0);
        assert_eq!(throttle.len(), 2);
    }
}
