//! In-memory node inventory.
//!
//! The admin panel's persisted records live in an external store. This
//! adapter holds a snapshot of them, seeded from the config file.

use crate::domain::config::NetStateConfig;
use crate::domain::errors::InventoryError;
use crate::domain::types::{CommunityRecord, NodeRecord};
use crate::ports::NodeInventory;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct InMemoryInventory {
    nodes: Vec<NodeRecord>,
    communities: Vec<CommunityRecord>,
}

impl InMemoryInventory {
    pub fn new(nodes: Vec<NodeRecord>, communities: Vec<CommunityRecord>) -> Self {
        Self { nodes, communities }
    }

    /// Seed from the `nodes` and `communities` tables of the config.
    pub fn from_config(config: &NetStateConfig) -> Self {
        Self::new(config.nodes.clone(), config.communities.clone())
    }
}

#[async_trait]
impl NodeInventory for InMemoryInventory {
    async fn nodes(&self) -> Result<Vec<NodeRecord>, InventoryError> {
        Ok(self.nodes.clone())
    }

    async fn communities(&self) -> Result<Vec<CommunityRecord>, InventoryError> {
        Ok(self.communities.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, mac: &str) -> NodeRecord {
        NodeRecord {
            id,
            name: format!("node-{id}"),
            virtual_address: format!("10.0.0.{id}"),
            hardware_address: mac.to_string(),
            community: "office".to_string(),
        }
    }

    #[tokio::test]
    async fn test_default_is_empty() {
        let inventory = InMemoryInventory::default();
        assert!(inventory.nodes().await.unwrap().is_empty());
        assert!(inventory.communities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nodes_in_insertion_order() {
        let inventory = InMemoryInventory::new(
            vec![node(2, "aa:bb:cc:dd:ee:02"), node(3, "aa:bb:cc:dd:ee:03")],
            Vec::new(),
        );
        let ids: Vec<u64> = inventory.nodes().await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_from_config_tables() {
        let config: NetStateConfig = toml::from_str(
            r#"
            [[nodes]]
            id = 7
            name = "laptop"
            virtual_address = "10.0.0.7"
            hardware_address = "AA-BB-CC-DD-EE-07"
            community = "office"

            [[communities]]
            id = 1
            name = "office"
            range = "10.0.0.0/24"
            "#,
        )
        .unwrap();

        let inventory = InMemoryInventory::from_config(&config);
        let nodes = inventory.nodes().await.unwrap();
        assert_eq!(nodes[0].hardware_addr().as_str(), "AABBCCDDEE07");
        assert_eq!(inventory.communities().await.unwrap()[0].range, "10.0.0.0/24");
    }
}
