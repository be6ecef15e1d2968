//! Error types.
//!
//! Transport failures surface as explicit errors to the immediate caller and
//! are never retried inline. Parse failures are not errors at all: malformed
//! lines are skipped by the parsers.

use thiserror::Error;

/// Management port (UDP control protocol) failures.
#[derive(Debug, Error)]
pub enum MgmtError {
    /// The control address did not resolve or is not a socket address.
    #[error("invalid management address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    /// Socket could not be bound or connected.
    #[error("management port unreachable: {0}")]
    Connect(#[source] std::io::Error),

    /// Command datagram could not be sent.
    #[error("failed to send management command: {0}")]
    Send(#[source] std::io::Error),

    /// Receive failed for a reason other than the end-of-response deadline.
    #[error("failed to read management response: {0}")]
    Receive(#[source] std::io::Error),

    /// The session did not complete within the overall deadline.
    #[error("management session exceeded {0:?}")]
    Timeout(std::time::Duration),
}

/// GeoIP lookup failures. Never shown to callers of the cache: they degrade
/// to sentinel locations.
#[derive(Debug, Error)]
pub enum GeoLookupError {
    #[error("GeoIP request failed: {0}")]
    Transport(String),

    #[error("GeoIP service returned status {0}")]
    Status(u16),

    #[error("GeoIP response could not be decoded: {0}")]
    Decode(String),

    /// The service answered but reported no result for the address.
    #[error("GeoIP service has no data for address: {0}")]
    NoData(String),
}

/// Journal follow failures. Always recoverable: the tailer restarts.
#[derive(Debug, Error)]
pub enum LogSourceError {
    #[error("failed to start log follower `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("log follower has no stdout")]
    NoOutput,

    #[error("log read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Inventory store failures (external collaborator).
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Node listing failures. Only the inventory can fail a listing; live-state
/// failures degrade to "offline".
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Diagnostic command failures.
///
/// `Disabled`, `UnknownCommand` and `InvalidTarget` reject the request
/// before anything runs. `Spawn` and `Timeout` come from the runner.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("network diagnostic tools are disabled")]
    Disabled,

    #[error("unsupported diagnostic command: {0}")]
    UnknownCommand(String),

    #[error("invalid target address: {0}")]
    InvalidTarget(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout {
        program: String,
        timeout: std::time::Duration,
    },
}

impl DiagnosticError {
    /// True when the request itself was refused, as opposed to a run that failed.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Disabled | Self::UnknownCommand(_) | Self::InvalidTarget(_)
        )
    }
}

/// Crate-level error for construction and wiring.
#[derive(Debug, Error)]
pub enum NetStateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build GeoIP client: {0}")]
    GeoClient(String),
}
