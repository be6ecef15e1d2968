//! # n2n Network State
//!
//! Live network-state aggregation for an n2n supernode administration panel.
//!
//! Two independently arriving, independently stale sources feed this crate:
//!
//! - the supernode **management port** (UDP, text protocol), polled on demand
//!   for the set of currently registered edges;
//! - the supernode **journal**, followed continuously to infer which edge
//!   pairs are being relayed through the supernode instead of talking
//!   peer-to-peer.
//!
//! Both are merged at request time with the persisted node inventory and
//! GeoIP annotations into one sorted view.
//!
//! ## Architecture
//!
//! ```text
//!   journalctl -f ──▶ LogTailer ──▶ RelayTable ─────────┐
//!                                                       │
//!   UDP :56440  ◀──▶ MgmtClient (PeerSource) ───────────┼──▶ NetworkStateAggregator ──▶ AnnotatedNode[]
//!                                                       │
//!   ip-api.com  ◀──▶ GeoCache ──────────────────────────┤
//!                                                       │
//!   NodeInventory (persisted records) ──────────────────┘
//!
//!   login request ──▶ AuthGate ──▶ LoginThrottle
//!   log view      ──▶ LogViewer ──▶ journalctl (snapshot, follow)
//!   tool request  ──▶ Diagnostics ──▶ ping / traceroute
//! ```
//!
//! The crate follows Hexagonal Architecture:
//! - **Domain:** value types, configuration, pure parsers (edge table, journal line, address ordering)
//! - **Ports:** traits for every collaborator (transport, lookup, log source, inventory, clock)
//! - **Service:** the stateful components, each owning its own lock
//! - **Adapters:** tokio UDP, reqwest, `journalctl`, TOML, in-memory inventory
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use n2n_netstate::{InMemoryInventory, NetStateConfig, NetworkStateRuntime};
//!
//! let config = NetStateConfig::default();
//! let inventory = Arc::new(InMemoryInventory::from_config(&config));
//! let runtime = NetworkStateRuntime::from_config(config, inventory)?;
//! runtime.start();
//! let nodes = runtime.aggregator().list_nodes().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

/// Test utilities (ManualTimeSource, mock ports).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Domain
pub use domain::config::{
    AuthConfig, DiagnosticsConfig, GeoIpConfig, LoginConfig, LogsConfig, MgmtConfig,
    NetStateConfig, RelayConfig, ServerConfig,
};
pub use domain::diagnostics::{is_valid_target, DiagnosticOutput, DiagnosticTool};
pub use domain::errors::{
    AggregateError, ConfigError, DiagnosticError, GeoLookupError, InventoryError, LogSourceError,
    MgmtError, NetStateError,
};
pub use domain::types::{
    AnnotatedNode, CommunityRecord, ConnectionType, HardwareAddr, Location, LoginAttempt,
    NetworkStats, NodeRecord, PeerRecord, RelayPair, ThrottleKey, Timestamp, Topology,
    TopologyEdge, TopologyGroup, TopologyNode,
};

// Ports
pub use ports::inbound::NetworkStateApi;
pub use ports::outbound::{
    ControlTransport, CredentialVerifier, DiagnosticRunner, GeoLookup, LogSource, LogStream,
    NodeInventory, PeerSource, TimeSource,
};

// Adapters
pub use adapters::{
    CommandDiagnosticRunner, CommandLogSource, DisabledGeoLookup, InMemoryInventory, IpApiLookup,
    StaticCredentials, SystemTimeSource, TomlConfigProvider, UdpControlTransport,
};

// Services
pub use service::aggregator::NetworkStateAggregator;
pub use service::auth::{AuthGate, AuthOutcome};
pub use service::diagnostics::Diagnostics;
pub use service::geo_cache::GeoCache;
pub use service::logs::LogViewer;
pub use service::mgmt::MgmtClient;
pub use service::relay::{LogTailer, RelayTable};
pub use service::runtime::{NetworkStateRuntime, RuntimeParts};
pub use service::throttle::{LockStatus, LoginThrottle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
