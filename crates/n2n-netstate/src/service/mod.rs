//! # Service Layer
//!
//! Stateful components. Each owns its table and its lock; none shares a
//! lock with another.

pub mod aggregator;
pub mod auth;
pub mod diagnostics;
pub mod geo_cache;
pub mod logs;
pub mod mgmt;
pub mod relay;
pub mod runtime;
pub mod throttle;

pub use aggregator::NetworkStateAggregator;
pub use auth::{AuthGate, AuthOutcome};
pub use diagnostics::Diagnostics;
pub use geo_cache::GeoCache;
pub use logs::LogViewer;
pub use mgmt::MgmtClient;
pub use relay::{LogTailer, RelayTable};
pub use runtime::{NetworkStateRuntime, RuntimeParts};
pub use throttle::{LockStatus, LoginThrottle};
