//! # Login Throttle under Load
//!
//! Lockouts through the auth gate and the hard cap on tracked keys when an
//! attacker sprays from many addresses.

#[cfg(test)]
mod tests {
    use n2n_netstate::test_utils::{ManualTimeSource, StaticVerifier};
    use n2n_netstate::{AuthGate, AuthOutcome, LoginConfig, LoginThrottle, ThrottleKey};
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::time::Duration;

    const CAP: usize = 10_000;

    fn gate() -> (AuthGate, Arc<LoginThrottle>, Arc<ManualTimeSource>) {
        gate_with(LoginConfig::default())
    }

    fn gate_with(config: LoginConfig) -> (AuthGate, Arc<LoginThrottle>, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(100_000_000));
        let throttle = Arc::new(LoginThrottle::new(config, clock.clone()));
        let gate = AuthGate::new(
            throttle.clone(),
            Arc::new(StaticVerifier::new("admin", "correct horse")),
        );
        (gate, throttle, clock)
    }

    fn client(i: u32) -> Ipv4Addr {
        Ipv4Addr::from(0x0A00_0000 + i)
    }

    #[test]
    fn test_spray_from_many_clients_stays_under_cap() {
        let (_, throttle, clock) = gate();
        let account = ThrottleKey::account("admin");

        for i in 0..10_050 {
            throttle.record_failure(&ThrottleKey::client(client(i)), &account);
            if i % 1_000 == 0 {
                clock.advance(Duration::from_millis(1));
            }
        }

        assert!(throttle.len() <= CAP);
        // the targeted account is written on every attempt and never evicted
        assert!(throttle.check_lock(&account).is_locked());
    }

    #[test]
    fn test_distinct_accounts_through_gate_stay_under_cap() {
        let config = LoginConfig {
            max_records: 1_000,
            ..LoginConfig::default()
        };
        let (gate, throttle, _) = gate_with(config);

        for i in 0..1_050 {
            let outcome = gate.authenticate(client(i), &format!("user{i}"), "guess");
            assert_eq!(outcome, AuthOutcome::Denied);
        }

        assert!(throttle.len() <= 1_000);
        // the newest pair survives
        assert_eq!(throttle.failure_count(&ThrottleKey::account("user1049")), 1);
        assert_eq!(throttle.failure_count(&ThrottleKey::client(client(1049))), 1);
    }

    #[test]
    fn test_lockout_and_recovery() {
        let (gate, throttle, clock) = gate();
        let ip = Ipv4Addr::new(203, 0, 113, 7);

        for _ in 0..4 {
            assert_eq!(gate.authenticate(ip, "admin", "nope"), AuthOutcome::Denied);
        }
        assert_eq!(
            gate.authenticate(ip, "admin", "nope"),
            AuthOutcome::Locked {
                remaining: Duration::from_secs(900)
            }
        );

        clock.advance(Duration::from_secs(60));
        assert_eq!(
            gate.authenticate(ip, "admin", "correct horse"),
            AuthOutcome::Locked {
                remaining: Duration::from_secs(840)
            }
        );

        clock.advance(Duration::from_secs(840));
        assert_eq!(
            gate.authenticate(ip, "admin", "correct horse"),
            AuthOutcome::Granted
        );
        assert_eq!(throttle.failure_count(&ThrottleKey::account("admin")), 0);
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_locked_account_rejects_fresh_client() {
        let (gate, _, _) = gate();

        for i in 0..5 {
            gate.authenticate(client(i), "admin", "nope");
        }

        let outcome = gate.authenticate(Ipv4Addr::new(198, 51, 100, 1), "admin", "correct horse");
        assert!(matches!(outcome, AuthOutcome::Locked { .. }));
    }

    #[test]
    fn test_sweep_forgets_idle_failures() {
        let (gate, throttle, clock) = gate();

        gate.authenticate(Ipv4Addr::new(203, 0, 113, 8), "admin", "nope");
        assert_eq!(throttle.len(), 2);

        clock.advance(Duration::from_secs(30 * 60));
        assert_eq!(throttle.sweep(), 0);

        clock.advance(Duration::from_secs(31 * 60));
        assert_eq!(throttle.sweep(), 2);
        assert!(throttle.is_empty());
    }
}
