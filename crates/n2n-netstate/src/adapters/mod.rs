//! # Adapters Layer
//!
//! Concrete implementations of the driven ports:
//!
//! - `UdpControlTransport` - supernode management port over tokio UDP
//! - `IpApiLookup` - GeoIP over HTTP (reqwest)
//! - `CommandLogSource` - `journalctl` child process
//! - `CommandDiagnosticRunner` - `ping`/`traceroute` child process
//! - `InMemoryInventory` - node and community records seeded from config
//! - `TomlConfigProvider` - config file plus environment overrides
//! - `StaticCredentials` - single admin account with an Argon2 password hash
//! - `SystemTimeSource` - wall clock

pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod geoip;
pub mod inventory;
pub mod journal;
pub mod time;
pub mod udp;

pub use config::TomlConfigProvider;
pub use credentials::StaticCredentials;
pub use diagnostics::CommandDiagnosticRunner;
pub use geoip::{DisabledGeoLookup, IpApiLookup};
pub use inventory::InMemoryInventory;
pub use journal::CommandLogSource;
pub use time::SystemTimeSource;
pub use udp::UdpControlTransport;
