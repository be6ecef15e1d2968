//! # Relay Detection Flow
//!
//! Journal lines travel through the supervised tailer into the relay table
//! and show up as `Relay` connections in the node listing until they go
//! stale. A broken stream is re-attached.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{eventually, office_community, office_nodes, EDGES_RESPONSE};
    use n2n_netstate::test_utils::{
        ChannelLogSource, ManualTimeSource, MockGeoLookup, RecordingDiagnosticRunner,
        ScriptedTransport, StaticVerifier,
    };
    use n2n_netstate::{
        ConnectionType, InMemoryInventory, NetStateConfig, NetworkStateRuntime, RuntimeParts,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const FORWARD_09_TO_10: &str = "Mar 02 10:00:01 gw supernode[812]: forwarding packet of 98 bytes \
                                    from aa:bb:cc:dd:ee:09 to aa:bb:cc:dd:ee:10";

    struct Harness {
        runtime: NetworkStateRuntime,
        logs: Arc<ChannelLogSource>,
        clock: Arc<ManualTimeSource>,
    }

    fn harness() -> Harness {
        let mut config = NetStateConfig::default();
        config.relay.restart_backoff = Duration::from_millis(10);
        config.relay.open_backoff = Duration::from_millis(10);

        let logs = Arc::new(ChannelLogSource::new());
        let clock = Arc::new(ManualTimeSource::new(50_000_000));
        let parts = RuntimeParts {
            inventory: Arc::new(InMemoryInventory::new(office_nodes(), office_community())),
            transport: Arc::new(ScriptedTransport::new(EDGES_RESPONSE)),
            geo_lookup: Arc::new(MockGeoLookup::new()),
            log_source: logs.clone(),
            recent_logs: Arc::new(ChannelLogSource::new()),
            follow_logs: Arc::new(ChannelLogSource::new()),
            diagnostic_runner: Arc::new(RecordingDiagnosticRunner::new()),
            verifier: Arc::new(StaticVerifier::new("admin", "pw")),
            clock: clock.clone(),
        };
        Harness {
            runtime: NetworkStateRuntime::new(config, parts),
            logs,
            clock,
        }
    }

    #[tokio::test]
    async fn test_forwarding_lines_mark_both_sides_relayed() {
        let h = harness();
        let tx = h.logs.push_session();
        h.runtime.start();

        tx.send(Ok("supernode[812]: edge registered".into())).unwrap();
        tx.send(Ok(FORWARD_09_TO_10.into())).unwrap();
        tx.send(Ok(FORWARD_09_TO_10.into())).unwrap();

        let relays = h.runtime.relays();
        assert!(eventually(|| relays.len() == 1).await);
        assert!(eventually(|| h.runtime.aggregator().active_relays()[0].packet_count == 2).await);
        let pairs = h.runtime.aggregator().active_relays();
        assert_eq!(pairs[0].source.as_str(), "AABBCCDDEE09");
        assert_eq!(pairs[0].destination.as_str(), "AABBCCDDEE10");

        let nodes = h.runtime.aggregator().list_nodes().await.unwrap();
        let kind = |name: &str| {
            nodes
                .iter()
                .find(|n| n.name == name)
                .and_then(|n| n.connection_type)
        };
        assert_eq!(kind("laptop"), Some(ConnectionType::Relay));
        assert_eq!(kind("nas"), Some(ConnectionType::Relay));
        assert_eq!(kind("Unregistered node"), Some(ConnectionType::PeerToPeer));
        assert_eq!(kind("printer"), None);

        h.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_pairs_expire_on_read_after_window() {
        let h = harness();
        let tx = h.logs.push_session();
        h.runtime.start();

        tx.send(Ok(FORWARD_09_TO_10.into())).unwrap();
        let relays = h.runtime.relays();
        assert!(eventually(|| relays.len() == 1).await);

        h.clock.advance(Duration::from_secs(59));
        assert_eq!(h.runtime.aggregator().active_relays().len(), 1);

        h.clock.advance(Duration::from_secs(2));
        // still stored until somebody reads
        assert_eq!(relays.len(), 1);
        assert!(h.runtime.aggregator().active_relays().is_empty());
        assert_eq!(relays.len(), 0);

        let nodes = h.runtime.aggregator().list_nodes().await.unwrap();
        let laptop = nodes.iter().find(|n| n.name == "laptop").unwrap();
        assert_eq!(laptop.connection_type, Some(ConnectionType::PeerToPeer));

        h.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_tailer_reattaches_after_stream_ends() {
        let h = harness();
        let first = h.logs.push_session();
        let second = h.logs.push_session();
        h.runtime.start();

        first.send(Ok(FORWARD_09_TO_10.into())).unwrap();
        let relays = h.runtime.relays();
        assert!(eventually(|| relays.len() == 1).await);

        // follower exits; the tailer backs off and opens the next session
        drop(first);
        assert!(eventually(|| h.logs.opens() >= 2).await);

        second
            .send(Ok("supernode: forwarding packet from aa:bb:cc:dd:ee:10 to aa:bb:cc:dd:ee:ff".into()))
            .unwrap();
        assert!(eventually(|| relays.len() == 2).await);

        h.runtime.shutdown().await;
        assert!(!h.runtime.is_running());
    }

    #[tokio::test]
    async fn test_tailer_retries_when_log_cannot_open() {
        let h = harness();
        h.runtime.start();

        // nothing queued: every open fails and is retried
        assert!(eventually(|| h.logs.opens() >= 3).await);

        let tx = h.logs.push_session();
        tx.send(Ok(FORWARD_09_TO_10.into())).unwrap();
        let relays = h.runtime.relays();
        assert!(eventually(|| relays.len() == 1).await);

        h.runtime.shutdown().await;
    }
}
