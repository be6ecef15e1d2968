//! # Node Listing
//!
//! The runtime wired from test doubles: inventory records merged with the
//! live edge table, unmapped edges, GeoIP annotation and degraded sources.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{office_community, office_nodes, EDGES_RESPONSE};
    use n2n_netstate::test_utils::{
        ChannelLogSource, ManualTimeSource, MockGeoLookup, RecordingDiagnosticRunner,
        ScriptedTransport, StaticVerifier,
    };
    use n2n_netstate::{
        ConnectionType, ControlTransport, InMemoryInventory, NetStateConfig, NetworkStateApi,
        NetworkStateRuntime, RuntimeParts,
    };
    use std::sync::Arc;

    struct Harness {
        runtime: NetworkStateRuntime,
        geo: Arc<MockGeoLookup>,
    }

    fn harness(transport: Arc<dyn ControlTransport>) -> Harness {
        let geo = Arc::new(MockGeoLookup::new());
        let parts = RuntimeParts {
            inventory: Arc::new(InMemoryInventory::new(office_nodes(), office_community())),
            transport,
            geo_lookup: geo.clone(),
            log_source: Arc::new(ChannelLogSource::new()),
            recent_logs: Arc::new(ChannelLogSource::new()),
            follow_logs: Arc::new(ChannelLogSource::new()),
            diagnostic_runner: Arc::new(RecordingDiagnosticRunner::new()),
            verifier: Arc::new(StaticVerifier::new("admin", "pw")),
            clock: Arc::new(ManualTimeSource::new(10_000_000)),
        };
        Harness {
            runtime: NetworkStateRuntime::new(NetStateConfig::default(), parts),
            geo,
        }
    }

    #[tokio::test]
    async fn test_listing_sorted_and_annotated() {
        let h = harness(Arc::new(ScriptedTransport::new(EDGES_RESPONSE)));
        let nodes = h.runtime.aggregator().list_nodes().await.unwrap();

        let order: Vec<&str> = nodes.iter().map(|n| n.virtual_address.as_str()).collect();
        assert_eq!(order, vec!["10.0.0.3", "10.0.0.9", "10.0.0.10", "10.0.0.200"]);

        let laptop = &nodes[1];
        assert!(laptop.is_online && laptop.is_mapped);
        assert_eq!(laptop.external_address.as_deref(), Some("198.51.100.9"));
        assert_eq!(
            laptop.location.as_deref(),
            Some("Testland City of 198.51.100.9 (Test ISP)")
        );
        assert_eq!(laptop.connection_type, Some(ConnectionType::PeerToPeer));

        let printer = &nodes[0];
        assert!(!printer.is_online);
        assert!(printer.location.is_none());
    }

    #[tokio::test]
    async fn test_unmapped_edge_listed() {
        let h = harness(Arc::new(ScriptedTransport::new(EDGES_RESPONSE)));
        let nodes = h.runtime.aggregator().list_nodes().await.unwrap();

        let unmapped = nodes
            .iter()
            .find(|n| n.hardware_address == "AABBCCDDEEFF")
            .unwrap();
        assert_eq!(unmapped.id, 0);
        assert_eq!(unmapped.name, "Unregistered node");
        assert_eq!(unmapped.community, "Unknown");
        assert!(unmapped.is_online);
        assert!(!unmapped.is_mapped);
        assert_eq!(
            unmapped.location.as_deref(),
            Some("Testland City of 198.51.100.200")
        );
    }

    #[tokio::test]
    async fn test_geoip_cached_across_listings() {
        let h = harness(Arc::new(ScriptedTransport::new(EDGES_RESPONSE)));
        let aggregator = h.runtime.aggregator();

        aggregator.list_nodes().await.unwrap();
        aggregator.list_nodes().await.unwrap();

        assert_eq!(h.geo.calls_for("198.51.100.9"), 1);
        assert_eq!(h.geo.calls(), 3);
        assert!(h.runtime.geo_cache().contains("198.51.100.10"));
    }

    #[tokio::test]
    async fn test_geoip_failure_degrades_to_sentinel() {
        let h = harness(Arc::new(ScriptedTransport::new(EDGES_RESPONSE)));
        h.geo.set_failing(true);

        let nodes = h.runtime.aggregator().list_nodes().await.unwrap();
        let laptop = nodes.iter().find(|n| n.name == "laptop").unwrap();
        assert_eq!(laptop.location.as_deref(), Some("Unknown Lookup failed (-)"));

        // failures are not cached
        h.geo.set_failing(false);
        h.runtime.aggregator().list_nodes().await.unwrap();
        assert_eq!(h.geo.calls_for("198.51.100.9"), 2);
    }

    #[tokio::test]
    async fn test_unreachable_port_lists_inventory_offline() {
        let h = harness(Arc::new(ScriptedTransport::unreachable()));
        let nodes = h.runtime.aggregator().list_nodes().await.unwrap();

        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| !n.is_online));
        assert!(nodes.iter().all(|n| n.connection_type.is_none()));
        assert_eq!(h.geo.calls(), 0);
    }

    #[tokio::test]
    async fn test_stats_and_topology() {
        let h = harness(Arc::new(ScriptedTransport::new(EDGES_RESPONSE)));
        let api: Arc<dyn NetworkStateApi> = h.runtime.aggregator();

        let stats = api.stats().await.unwrap();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.community_count, 1);
        // unmapped edges count as online
        assert_eq!(stats.online_count, 3);

        let topology = api.topology().await.unwrap();
        assert_eq!(topology.nodes.len(), 4);
        assert_eq!(topology.edges.len(), 2);
        assert!(topology.edges.iter().all(|e| e.from == "supernode"));
    }
}
