//! Management port client.

use crate::domain::edges::parse_edges;
use crate::domain::errors::MgmtError;
use crate::domain::types::{HardwareAddr, PeerRecord};
use crate::metrics;
use crate::ports::{ControlTransport, PeerSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Queries the supernode for its registered edges.
pub struct MgmtClient {
    transport: Arc<dyn ControlTransport>,
    command: String,
}

impl MgmtClient {
    pub fn new(transport: Arc<dyn ControlTransport>, command: impl Into<String>) -> Self {
        Self {
            transport,
            command: command.into(),
        }
    }

    /// Live peers keyed by canonical hardware address.
    ///
    /// A transport failure is returned as is; there is no partial result.
    pub async fn query_peers(&self) -> Result<HashMap<HardwareAddr, PeerRecord>, MgmtError> {
        let response = match self.transport.exchange(&self.command).await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_mgmt_query(false);
                warn!(error = %e, command = %self.command, "Management query failed");
                return Err(e);
            }
        };

        metrics::record_mgmt_query(true);
        let peers = parse_edges(&response);
        debug!(bytes = response.len(), peers = peers.len(), "Management query completed");
        Ok(peers)
    }

    /// Online hardware addresses with their last-seen counters.
    pub async fn query_online_keys(&self) -> Result<HashMap<HardwareAddr, u64>, MgmtError> {
        let peers = self.query_peers().await?;
        Ok(peers
            .into_iter()
            .map(|(addr, peer)| (addr, peer.last_seen))
            .collect())
    }
}

#[async_trait]
impl PeerSource for MgmtClient {
    async fn query_peers(&self) -> Result<HashMap<HardwareAddr, PeerRecord>, MgmtError> {
        MgmtClient::query_peers(self).await
    }
}
