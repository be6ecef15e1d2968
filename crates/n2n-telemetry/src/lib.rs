//! # n2n Telemetry
//!
//! Logging bootstrap shared by the n2n-admin binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use n2n_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `N2N_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `N2N_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `N2N_LOG_ANSI` | `true` | Colored console output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter `{filter}`: {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}
