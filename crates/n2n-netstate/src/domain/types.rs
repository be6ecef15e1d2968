//! Core value types shared by every component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

// =============================================================================
// TIME
// =============================================================================

/// Wall-clock instant in milliseconds since the Unix epoch.
///
/// All ephemeral tables stamp their entries with a `Timestamp` obtained from a
/// [`TimeSource`](crate::ports::TimeSource), so tests can drive time by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create a timestamp from whole seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    pub const fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// `self + duration`, saturating at `u64::MAX`.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_millis(duration)))
    }

    /// Elapsed time from `earlier` to `self`; zero if `earlier` is in the future.
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// HARDWARE ADDRESS
// =============================================================================

/// Edge MAC address in canonical form: uppercase hex, no separators.
///
/// `aa:bb:cc:dd:ee:ff`, `AA-BB-CC-DD-EE-FF` and `aabbccddeeff` all map to
/// `AABBCCDDEEFF`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareAddr(String);

impl HardwareAddr {
    /// Canonicalize without validating. Stored inventory records go through
    /// this so a malformed record still gets a stable join key.
    pub fn canonical(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| !matches!(c, ':' | '-') && !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(cleaned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// MANAGEMENT PORT
// =============================================================================

/// One registered edge as reported by the supernode management port.
///
/// Replaced wholesale on every successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub hardware_addr: HardwareAddr,
    /// Overlay address as reported by the supernode (may be empty).
    pub internal: String,
    /// Public `ip:port` the supernode last saw the edge from.
    pub external: String,
    /// Last-seen counter, protocol-defined units.
    pub last_seen: u64,
}

impl PeerRecord {
    /// Host part of the external address.
    pub fn external_ip(&self) -> &str {
        external_host(&self.external)
    }
}

/// Strip the port from an `ip:port` pair (`[v6]:port` understood).
pub fn external_host(external: &str) -> &str {
    let trimmed = external.trim();
    if trimmed.parse::<SocketAddr>().is_ok() {
        if let Some(rest) = trimmed.strip_prefix('[') {
            return rest.split(']').next().unwrap_or(rest);
        }
    }
    trimmed.split(':').next().unwrap_or(trimmed)
}

// =============================================================================
// RELAY DETECTION
// =============================================================================

/// Ordered (source, destination) pair identifying a relayed flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelayKey {
    pub source: HardwareAddr,
    pub destination: HardwareAddr,
}

impl fmt::Display for RelayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)
    }
}

/// A relayed edge pair inferred from the supernode journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayPair {
    pub source: HardwareAddr,
    pub destination: HardwareAddr,
    pub last_active: Timestamp,
    pub packet_count: u64,
}

impl RelayPair {
    pub fn key(&self) -> RelayKey {
        RelayKey {
            source: self.source.clone(),
            destination: self.destination.clone(),
        }
    }
}

// =============================================================================
// GEOIP
// =============================================================================

/// Best-effort location of a public address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub city: String,
    pub isp: String,
}

impl Location {
    pub const UNKNOWN_COUNTRY: &'static str = "Unknown";
    pub const LOCAL_COUNTRY: &'static str = "Local network";

    pub fn new(country: impl Into<String>, city: impl Into<String>, isp: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            isp: isp.into(),
        }
    }

    /// Fixed result for loopback and private ranges. Never cached.
    pub fn local() -> Self {
        Self::new(Self::LOCAL_COUNTRY, "-", "-")
    }

    /// The lookup could not be performed (transport failure).
    pub fn lookup_failed() -> Self {
        Self::new(Self::UNKNOWN_COUNTRY, "Lookup failed", "-")
    }

    /// The lookup ran but the service had no answer.
    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN_COUNTRY, "-", "-")
    }

    pub fn is_unknown(&self) -> bool {
        self.country == Self::UNKNOWN_COUNTRY
    }

    /// `"Country City (ISP)"`
    pub fn describe(&self) -> String {
        format!("{} {} ({})", self.country, self.city, self.isp)
    }

    /// `"Country City"`
    pub fn describe_short(&self) -> String {
        format!("{} {}", self.country, self.city)
    }
}

// =============================================================================
// LOGIN THROTTLE
// =============================================================================

/// Key under which failed logins are counted.
///
/// Client keys are the textual network address; account keys carry the
/// `account:` prefix so they can never collide with an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThrottleKey(String);

impl ThrottleKey {
    pub const ACCOUNT_PREFIX: &'static str = "account:";

    pub fn client(addr: impl fmt::Display) -> Self {
        Self(addr.to_string())
    }

    pub fn account(name: &str) -> Self {
        Self(format!("{}{}", Self::ACCOUNT_PREFIX, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure bookkeeping for one [`ThrottleKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub failure_count: u32,
    pub locked_until: Option<Timestamp>,
    pub last_failure: Timestamp,
}

impl LoginAttempt {
    pub fn new(now: Timestamp) -> Self {
        Self {
            failure_count: 0,
            locked_until: None,
            last_failure: now,
        }
    }

    pub fn is_locked(&self, now: Timestamp) -> bool {
        matches!(self.locked_until, Some(until) if now < until)
    }

    /// Unlocked and no failure for at least `idle`.
    pub fn is_stale(&self, now: Timestamp, idle: Duration) -> bool {
        !self.is_locked(now) && now.duration_since(self.last_failure) >= idle
    }
}

// =============================================================================
// INVENTORY
// =============================================================================

/// A node as persisted by the inventory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u64,
    pub name: String,
    pub virtual_address: String,
    /// As entered by the operator; canonicalized for joins.
    pub hardware_address: String,
    pub community: String,
}

impl NodeRecord {
    pub fn hardware_addr(&self) -> HardwareAddr {
        HardwareAddr::canonical(&self.hardware_address)
    }
}

/// A community as persisted by the inventory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityRecord {
    pub id: u64,
    pub name: String,
    /// Address range, e.g. `10.0.0.0/24`.
    #[serde(default)]
    pub range: String,
}

// =============================================================================
// AGGREGATED VIEWS
// =============================================================================

/// How an online edge reaches its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "p2p")]
    PeerToPeer,
    #[serde(rename = "relay")]
    Relay,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::PeerToPeer => f.write_str("P2P"),
            ConnectionType::Relay => f.write_str("Relay"),
        }
    }
}

/// One row of the node listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedNode {
    /// Inventory id; `0` for unmapped edges.
    pub id: u64,
    pub name: String,
    pub virtual_address: String,
    pub hardware_address: String,
    pub community: String,
    pub is_online: bool,
    /// `false` for edges seen live but absent from the inventory.
    pub is_mapped: bool,
    pub external_address: Option<String>,
    pub location: Option<String>,
    pub connection_type: Option<ConnectionType>,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    pub node_count: usize,
    pub community_count: usize,
    pub online_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyGroup {
    Supernode,
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: String,
    pub label: String,
    pub group: TopologyGroup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub from: String,
    pub to: String,
}

/// Star topology centred on the supernode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}
