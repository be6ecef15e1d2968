//! # Driven Ports (Outbound SPI)
//!
//! Every collaborator of the core sits behind one of these traits so tests
//! can substitute in-memory doubles.

use crate::domain::diagnostics::{DiagnosticOutput, DiagnosticTool};
use crate::domain::errors::{
    DiagnosticError, GeoLookupError, InventoryError, LogSourceError, MgmtError,
};
use crate::domain::types::{CommunityRecord, HardwareAddr, Location, NodeRecord, PeerRecord, Timestamp};
use async_trait::async_trait;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// Request/response exchange with the supernode management port.
///
/// One call sends `command` once and returns every byte received until the
/// daemon goes quiet. The protocol has no length prefix and no terminator.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    async fn exchange(&self, command: &str) -> Result<String, MgmtError>;
}

/// Source of the live peer map.
///
/// All-or-nothing: an error carries no partial data and means "unknown",
/// not "no peers".
#[async_trait]
pub trait PeerSource: Send + Sync {
    async fn query_peers(&self) -> Result<HashMap<HardwareAddr, PeerRecord>, MgmtError>;
}

/// Single outbound GeoIP lookup, uncached.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// `Err(GeoLookupError::NoData)` when the service answered without a
    /// result; any other error is a transport failure.
    async fn lookup(&self, address: &str) -> Result<Location, GeoLookupError>;
}

/// Line stream produced by a [`LogSource`]. Ends when the follower exits.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<String, LogSourceError>> + Send>>;

/// Handle on a log-printing command. Whether the stream follows or ends
/// after a backlog depends on the command.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn open(&self) -> Result<LogStream, LogSourceError>;
}

/// Runs one allowed diagnostic tool against an already validated target.
#[async_trait]
pub trait DiagnosticRunner: Send + Sync {
    /// A tool that ran but exited non-zero is `Ok` with `error` set.
    async fn run(
        &self,
        tool: DiagnosticTool,
        target: &str,
    ) -> Result<DiagnosticOutput, DiagnosticError>;
}

/// Persisted node and community records. Read-only to the core.
#[async_trait]
pub trait NodeInventory: Send + Sync {
    async fn nodes(&self) -> Result<Vec<NodeRecord>, InventoryError>;

    async fn communities(&self) -> Result<Vec<CommunityRecord>, InventoryError>;
}

/// Credential check used by the auth gate. Token issuance is elsewhere.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, account: &str, password: &str) -> bool;
}

/// Abstract interface for time-related operations.
///
/// Production uses the system clock; tests drive a manual clock.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}
