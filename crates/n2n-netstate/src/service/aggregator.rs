//! Request-time join of inventory, live peers, relay state and GeoIP.
//!
//! Each source is read under its own lock; the join is consistent per
//! source, not across sources.

use crate::domain::errors::AggregateError;
use crate::domain::ordering::compare_virtual_addresses;
use crate::domain::types::{
    AnnotatedNode, ConnectionType, HardwareAddr, Location, NetworkStats, PeerRecord, RelayPair,
    Topology, TopologyEdge, TopologyGroup, TopologyNode,
};
use crate::ports::{NetworkStateApi, NodeInventory, PeerSource};
use crate::service::geo_cache::GeoCache;
use crate::service::relay::RelayTable;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Name given to live edges missing from the inventory.
pub const UNMAPPED_NAME: &str = "Unregistered node";
/// Community given to live edges missing from the inventory.
pub const UNMAPPED_COMMUNITY: &str = "Unknown";
/// Topology id of the hub node.
pub const SUPERNODE_ID: &str = "supernode";

pub struct NetworkStateAggregator {
    inventory: Arc<dyn NodeInventory>,
    peers: Arc<dyn PeerSource>,
    relays: Arc<RelayTable>,
    geo: Arc<GeoCache>,
}

impl NetworkStateAggregator {
    pub fn new(
        inventory: Arc<dyn NodeInventory>,
        peers: Arc<dyn PeerSource>,
        relays: Arc<RelayTable>,
        geo: Arc<GeoCache>,
    ) -> Self {
        Self {
            inventory,
            peers,
            relays,
            geo,
        }
    }

    /// Annotated node listing, sorted by virtual address.
    pub async fn list_nodes(&self) -> Result<Vec<AnnotatedNode>, AggregateError> {
        let records = self.inventory.nodes().await?;
        let live = self.live_peers().await;
        let relayed = self.relays.relayed_addresses();
        let locations = self.resolve_locations(live.values()).await;

        let connection = |addr: &HardwareAddr| {
            if relayed.contains(addr) {
                ConnectionType::Relay
            } else {
                ConnectionType::PeerToPeer
            }
        };

        let mut mapped = HashSet::with_capacity(records.len());
        let mut nodes = Vec::with_capacity(records.len() + live.len());

        for record in records {
            let addr = record.hardware_addr();
            let peer = live.get(&addr);
            let location = peer.and_then(|p| locations.get(p.external_ip()));

            nodes.push(AnnotatedNode {
                id: record.id,
                name: record.name,
                virtual_address: record.virtual_address,
                hardware_address: record.hardware_address,
                community: record.community,
                is_online: peer.is_some(),
                is_mapped: true,
                external_address: peer.map(|p| p.external_ip().to_string()),
                location: location.map(Location::describe),
                connection_type: peer.map(|_| connection(&addr)),
            });
            mapped.insert(addr);
        }

        let mut unmapped: Vec<&PeerRecord> = live
            .values()
            .filter(|peer| !mapped.contains(&peer.hardware_addr))
            .collect();
        unmapped.sort_by(|a, b| a.hardware_addr.cmp(&b.hardware_addr));

        for peer in unmapped {
            debug!(hardware_addr = %peer.hardware_addr, "Live edge not in inventory");
            nodes.push(AnnotatedNode {
                id: 0,
                name: UNMAPPED_NAME.to_string(),
                virtual_address: peer.internal.clone(),
                hardware_address: peer.hardware_addr.to_string(),
                community: UNMAPPED_COMMUNITY.to_string(),
                is_online: true,
                is_mapped: false,
                external_address: Some(peer.external_ip().to_string()),
                location: locations
                    .get(peer.external_ip())
                    .map(Location::describe_short),
                connection_type: Some(connection(&peer.hardware_addr)),
            });
        }

        nodes.sort_by(|a, b| compare_virtual_addresses(&a.virtual_address, &b.virtual_address));
        Ok(nodes)
    }

    /// Relay pairs within the staleness window.
    pub fn active_relays(&self) -> Vec<RelayPair> {
        self.relays.active_relays()
    }

    pub async fn stats(&self) -> Result<NetworkStats, AggregateError> {
        let node_count = self.inventory.nodes().await?.len();
        let community_count = self.inventory.communities().await?.len();
        let online_count = self.live_peers().await.len();

        Ok(NetworkStats {
            node_count,
            community_count,
            online_count,
        })
    }

    /// Hub plus one node per inventory record, linked when online.
    pub async fn topology(&self) -> Result<Topology, AggregateError> {
        let records = self.inventory.nodes().await?;
        let live = self.live_peers().await;

        let mut topology = Topology {
            nodes: Vec::with_capacity(records.len() + 1),
            edges: Vec::new(),
        };
        topology.nodes.push(TopologyNode {
            id: SUPERNODE_ID.to_string(),
            label: "Supernode".to_string(),
            group: TopologyGroup::Supernode,
        });

        for record in records {
            let addr = record.hardware_addr();
            let online = live.contains_key(&addr);
            if online {
                topology.edges.push(TopologyEdge {
                    from: SUPERNODE_ID.to_string(),
                    to: addr.to_string(),
                });
            }
            topology.nodes.push(TopologyNode {
                id: addr.to_string(),
                label: record.name,
                group: if online {
                    TopologyGroup::Online
                } else {
                    TopologyGroup::Offline
                },
            });
        }

        Ok(topology)
    }

    /// Live peers, or an empty map when the management port is unavailable.
    async fn live_peers(&self) -> HashMap<HardwareAddr, PeerRecord> {
        match self.peers.query_peers().await {
            Ok(peers) => peers,
            Err(e) => {
                warn!(error = %e, "Live peer state unavailable, reporting all nodes offline");
                HashMap::new()
            }
        }
    }

    /// One resolution per distinct external address, run concurrently.
    async fn resolve_locations<'a>(
        &self,
        peers: impl Iterator<Item = &'a PeerRecord>,
    ) -> HashMap<String, Location> {
        let addresses: HashSet<&str> = peers.map(PeerRecord::external_ip).collect();
        let lookups = addresses.into_iter().map(|address| async move {
            (address.to_string(), self.geo.resolve(address).await)
        });
        join_all(lookups).await.into_iter().collect()
    }
}

#[async_trait]
impl NetworkStateApi for NetworkStateAggregator {
    async fn list_nodes(&self) -> Result<Vec<AnnotatedNode>, AggregateError> {
        NetworkStateAggregator::list_nodes(self).await
    }

    fn active_relays(&self) -> Vec<RelayPair> {
        NetworkStateAggregator::active_relays(self)
    }

    async fn stats(&self) -> Result<NetworkStats, AggregateError> {
        NetworkStateAggregator::stats(self).await
    }

    async fn topology(&self) -> Result<Topology, AggregateError> {
        NetworkStateAggregator::topology(self).await
    }
}
