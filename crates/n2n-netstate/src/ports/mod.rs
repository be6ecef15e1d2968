//! # Ports Layer
//!
//! - **Driving Port (Inbound):** the read API the admin surface consumes
//! - **Driven Ports (Outbound):** collaborators supplied by adapters or tests

pub mod inbound;
pub mod outbound;

pub use inbound::NetworkStateApi;
pub use outbound::{
    ControlTransport, CredentialVerifier, DiagnosticRunner, GeoLookup, LogSource, LogStream,
    NodeInventory, PeerSource, TimeSource,
};
