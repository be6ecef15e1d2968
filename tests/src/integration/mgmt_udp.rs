//! # Management Port over UDP
//!
//! A loopback socket plays the supernode: it answers the `edges` command
//! with a response split across datagrams. The client must reassemble it,
//! skip the supernode section and feed the aggregator.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{office_community, office_nodes, EDGES_RESPONSE};
    use n2n_netstate::test_utils::{ManualTimeSource, MockGeoLookup};
    use n2n_netstate::{
        GeoCache, HardwareAddr, InMemoryInventory, MgmtClient, MgmtConfig,
        NetworkStateAggregator, RelayTable, UdpControlTransport,
    };
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::UdpSocket;

    /// Answer every datagram with `chunks`, one datagram each.
    async fn spawn_daemon(chunks: Vec<String>) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            while let Ok((_, from)) = socket.recv_from(&mut buf).await {
                for chunk in &chunks {
                    if socket.send_to(chunk.as_bytes(), from).await.is_err() {
                        return;
                    }
                }
            }
        });
        addr
    }

    fn split_response() -> Vec<String> {
        let at = EDGES_RESPONSE.find("SUPERNODES").unwrap();
        let (head, tail) = EDGES_RESPONSE.split_at(at);
        vec![head.to_string(), tail.to_string()]
    }

    fn client_for(addr: SocketAddr) -> MgmtClient {
        let config = MgmtConfig {
            addr: addr.to_string(),
            ..MgmtConfig::default()
        };
        MgmtClient::new(Arc::new(UdpControlTransport::new(&config)), "edges")
    }

    #[tokio::test]
    async fn test_multi_datagram_response_parsed() {
        let addr = spawn_daemon(split_response()).await;
        let client = client_for(addr);

        let peers = client.query_peers().await.unwrap();
        assert_eq!(peers.len(), 3);
        assert!(peers.contains_key(&HardwareAddr::canonical("aa:bb:cc:dd:ee:ff")));
        // federation peer from the SUPERNODES section is not an edge
        assert!(!peers.contains_key(&HardwareAddr::canonical("02:00:00:00:00:aa")));

        let laptop = &peers[&HardwareAddr::canonical("aa:bb:cc:dd:ee:09")];
        assert_eq!(laptop.internal, "10.0.0.9");
        assert_eq!(laptop.external_ip(), "198.51.100.9");
    }

    #[tokio::test]
    async fn test_online_keys_carry_last_seen() {
        let addr = spawn_daemon(split_response()).await;
        let keys = client_for(addr).query_online_keys().await.unwrap();

        assert_eq!(keys[&HardwareAddr::canonical("aa:bb:cc:dd:ee:10")], 1_700_000_010);
        assert_eq!(keys[&HardwareAddr::canonical("aa:bb:cc:dd:ee:ff")], 1_700_000_200);
    }

    #[tokio::test]
    async fn test_aggregator_over_real_socket() {
        let addr = spawn_daemon(split_response()).await;
        let clock = Arc::new(ManualTimeSource::new(5_000_000));
        let aggregator = NetworkStateAggregator::new(
            Arc::new(InMemoryInventory::new(office_nodes(), office_community())),
            Arc::new(client_for(addr)),
            Arc::new(RelayTable::new(clock.clone(), Duration::from_secs(60))),
            Arc::new(GeoCache::new(
                Arc::new(MockGeoLookup::new()),
                clock,
                Duration::from_secs(3600),
                100,
            )),
        );

        let nodes = aggregator.list_nodes().await.unwrap();
        let online: Vec<&str> = nodes
            .iter()
            .filter(|n| n.is_online)
            .map(|n| n.virtual_address.as_str())
            .collect();
        assert_eq!(online, vec!["10.0.0.9", "10.0.0.10", "10.0.0.200"]);

        let printer = nodes.iter().find(|n| n.name == "printer").unwrap();
        assert!(!printer.is_online);
        assert!(printer.connection_type.is_none());
    }

    #[tokio::test]
    async fn test_silent_port_means_everyone_offline() {
        // bound but never answers
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();

        let clock = Arc::new(ManualTimeSource::new(5_000_000));
        let aggregator = NetworkStateAggregator::new(
            Arc::new(InMemoryInventory::new(office_nodes(), office_community())),
            Arc::new(client_for(addr)),
            Arc::new(RelayTable::new(clock.clone(), Duration::from_secs(60))),
            Arc::new(GeoCache::new(
                Arc::new(MockGeoLookup::new()),
                clock,
                Duration::from_secs(3600),
                100,
            )),
        );

        let nodes = aggregator.list_nodes().await.unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| !n.is_online && n.is_mapped));
        drop(silent);
    }
}
