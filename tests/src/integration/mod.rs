//! Integration flows.

pub mod login_throttle;
pub mod mgmt_udp;
pub mod node_listing;
pub mod relay_flow;

/// Shared fixtures.
#[cfg(test)]
pub(crate) mod fixtures {
    use n2n_netstate::{CommunityRecord, NodeRecord};
    use std::time::Duration;

    /// `edges` response with two registered edges, a supernode section that
    /// must be ignored, and one edge the inventory does not know.
    pub const EDGES_RESPONSE: &str = "\
COMMUNITY 'office'
    id  tun_tap             MAC                EDGE                   HINT            LAST SEEN
    1 | 10.0.0.9          | aa:bb:cc:dd:ee:09 | 198.51.100.9:40000   |               | 1700000009
    2 | 10.0.0.10         | aa:bb:cc:dd:ee:10 | 198.51.100.10:40000  |               | 1700000010
SUPERNODES
    0 | sn-peer           | 02:00:00:00:00:aa | 203.0.113.1:7654     |               | 1700000000
SUPERNODE FORWARD
    3 | 10.0.0.200        | aa:bb:cc:dd:ee:ff | 198.51.100.200:40000 |               | 1700000200
";

    pub fn node(id: u64, name: &str, vip: &str, mac: &str) -> NodeRecord {
        NodeRecord {
            id,
            name: name.to_string(),
            virtual_address: vip.to_string(),
            hardware_address: mac.to_string(),
            community: "office".to_string(),
        }
    }

    pub fn office_nodes() -> Vec<NodeRecord> {
        vec![
            node(1, "laptop", "10.0.0.9", "aa:bb:cc:dd:ee:09"),
            node(2, "nas", "10.0.0.10", "AA-BB-CC-DD-EE-10"),
            node(3, "printer", "10.0.0.3", "aa:bb:cc:dd:ee:03"),
        ]
    }

    pub fn office_community() -> Vec<CommunityRecord> {
        vec![CommunityRecord {
            id: 1,
            name: "office".to_string(),
            range: "10.0.0.0/24".to_string(),
        }]
    }

    /// Poll `check` every 10ms for up to two seconds.
    pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }
}
