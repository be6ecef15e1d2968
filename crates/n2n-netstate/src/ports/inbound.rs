//! # Driving Port (Inbound API)
//!
//! What the network-state core offers to request handlers.

use crate::domain::errors::AggregateError;
use crate::domain::types::{AnnotatedNode, NetworkStats, RelayPair, Topology};
use async_trait::async_trait;

/// Read side of the live network state.
///
/// # Example
///
/// ```rust,ignore
/// async fn online<A: NetworkStateApi>(api: &A) -> usize {
///     api.list_nodes().await.map(|n| n.iter().filter(|n| n.is_online).count()).unwrap_or(0)
/// }
/// ```
#[async_trait]
pub trait NetworkStateApi: Send + Sync {
    /// Inventory joined with live peers, relay state and GeoIP, sorted by
    /// virtual address.
    ///
    /// Fails only if the inventory cannot be read. An unreachable
    /// management port makes every node offline instead.
    async fn list_nodes(&self) -> Result<Vec<AnnotatedNode>, AggregateError>;

    /// Relay pairs active within the staleness window. Reaps stale pairs.
    fn active_relays(&self) -> Vec<RelayPair>;

    /// Node, community and online counts.
    async fn stats(&self) -> Result<NetworkStats, AggregateError>;

    /// Star topology around the supernode.
    async fn topology(&self) -> Result<Topology, AggregateError>;
}
