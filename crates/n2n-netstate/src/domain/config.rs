//! Configuration with validation.
//!
//! Every section has `#[serde(default)]` so a config file only needs the keys
//! it overrides. Durations are written as `"50ms"`, `"60s"`, `"15m"`, `"24h"`.

use crate::domain::errors::ConfigError;
use crate::domain::types::{CommunityRecord, NodeRecord};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetStateConfig {
    /// Supernode management port
    pub mgmt: MgmtConfig,
    /// GeoIP annotation
    pub geoip: GeoIpConfig,
    /// Journal follower and relay table
    pub relay: RelayConfig,
    /// Login throttle
    pub login: LoginConfig,
    /// Admin credentials checked by the auth gate
    pub auth: AuthConfig,
    /// Admin HTTP listener
    pub server: ServerConfig,
    /// Host-side ping and traceroute
    pub diagnostics: DiagnosticsConfig,
    /// Daemon log view
    pub logs: LogsConfig,
    /// Seed records for the in-memory inventory
    pub nodes: Vec<NodeRecord>,
    /// Seed records for the in-memory inventory
    pub communities: Vec<CommunityRecord>,
}

impl NetStateConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mgmt.addr.trim().is_empty() {
            return Err(ConfigError::Invalid("mgmt.addr cannot be empty".into()));
        }
        if self.mgmt.command.trim().is_empty() {
            return Err(ConfigError::Invalid("mgmt.command cannot be empty".into()));
        }
        if self.mgmt.read_timeout.is_zero() || self.mgmt.first_read_timeout.is_zero() {
            return Err(ConfigError::Invalid("mgmt read deadlines cannot be 0".into()));
        }
        if self.mgmt.session_timeout < self.mgmt.first_read_timeout {
            return Err(ConfigError::Invalid(
                "mgmt.session_timeout must cover mgmt.first_read_timeout".into(),
            ));
        }
        if self.mgmt.buffer_size == 0 {
            return Err(ConfigError::Invalid("mgmt.buffer_size cannot be 0".into()));
        }

        if self.geoip.max_entries == 0 {
            return Err(ConfigError::Invalid("geoip.max_entries cannot be 0".into()));
        }
        if self.geoip.ttl.is_zero() {
            return Err(ConfigError::Invalid("geoip.ttl cannot be 0".into()));
        }
        if !self.geoip.endpoint.contains("{ip}") {
            return Err(ConfigError::Invalid(
                "geoip.endpoint must contain an {ip} placeholder".into(),
            ));
        }

        if self.relay.staleness_window.is_zero() {
            return Err(ConfigError::Invalid(
                "relay.staleness_window cannot be 0".into(),
            ));
        }
        if self.relay.log_command.is_empty() {
            return Err(ConfigError::Invalid("relay.log_command cannot be empty".into()));
        }

        if self.login.max_attempts == 0 {
            return Err(ConfigError::Invalid("login.max_attempts cannot be 0".into()));
        }
        if self.login.max_records < 2 {
            // one failure writes two keys
            return Err(ConfigError::Invalid("login.max_records must be at least 2".into()));
        }
        if self.login.lock_duration.is_zero() {
            return Err(ConfigError::Invalid("login.lock_duration cannot be 0".into()));
        }

        if self.diagnostics.timeout.is_zero() {
            return Err(ConfigError::Invalid("diagnostics.timeout cannot be 0".into()));
        }

        if self.logs.recent_command.is_empty() || self.logs.follow_command.is_empty() {
            return Err(ConfigError::Invalid("logs commands cannot be empty".into()));
        }
        if self.logs.recent_lines == 0 {
            return Err(ConfigError::Invalid("logs.recent_lines cannot be 0".into()));
        }

        Ok(())
    }
}

/// Management port configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MgmtConfig {
    /// `host:port` of the supernode management port
    pub addr: String,
    /// Command token sent in the single request datagram
    pub command: String,
    /// Deadline for the first response datagram
    #[serde(with = "humantime_serde")]
    pub first_read_timeout: Duration,
    /// Silence after a datagram that ends the response
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Hard cap on one request/response session
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,
    /// Receive buffer per datagram
    pub buffer_size: usize,
}

impl Default for MgmtConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:56440".to_string(),
            command: "edges".to_string(),
            first_read_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(50),
            session_timeout: Duration::from_secs(1),
            buffer_size: 8192,
        }
    }
}

/// GeoIP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoIpConfig {
    /// Disable to skip external lookups entirely (every address is "Unknown")
    pub enabled: bool,
    /// Lookup URL; `{ip}` is replaced by the address
    pub endpoint: String,
    /// Response language passed as `lang`
    pub language: String,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` for lookups
    pub use_env_proxy: bool,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Entry lifetime
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Cache capacity
    pub max_entries: usize,
    /// Interval of the expired-entry sweep
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://ip-api.com/json/{ip}".to_string(),
            language: "en".to_string(),
            use_env_proxy: true,
            request_timeout: Duration::from_secs(5),
            ttl: Duration::from_secs(24 * 60 * 60),
            max_entries: 1000,
            sweep_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Journal follower and relay table configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Inactivity after which a relay pair is no longer reported
    #[serde(with = "humantime_serde")]
    pub staleness_window: Duration,
    /// Program and arguments that stream new journal lines to stdout
    pub log_command: Vec<String>,
    /// Wait before re-attaching after the stream broke
    #[serde(with = "humantime_serde")]
    pub restart_backoff: Duration,
    /// Wait before retrying when the stream could not be opened
    #[serde(with = "humantime_serde")]
    pub open_backoff: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            staleness_window: Duration::from_secs(60),
            log_command: ["journalctl", "-u", "supernode", "-f", "-n", "0"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            restart_backoff: Duration::from_secs(2),
            open_backoff: Duration::from_secs(5),
        }
    }
}

/// Login throttle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Failures before a key is locked
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub lock_duration: Duration,
    /// Hard cap on tracked keys
    pub max_records: usize,
    /// On overflow, unlocked entries idle this long are purged first
    #[serde(with = "humantime_serde")]
    pub overflow_idle: Duration,
    /// Periodic sweep purges unlocked entries idle this long
    #[serde(with = "humantime_serde")]
    pub record_expiry: Duration,
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_duration: Duration::from_secs(15 * 60),
            max_records: 10_000,
            overflow_idle: Duration::from_secs(5 * 60),
            record_expiry: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

/// Admin credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    /// Argon2 PHC string of the password. `None` rejects every login.
    pub password_hash: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password_hash: None,
        }
    }
}

/// Diagnostic command configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Off unless the operator opts in
    pub enabled: bool,
    /// A run still going after this is killed
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Daemon log view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Prints recent lines and exits
    pub recent_command: Vec<String>,
    /// Prints recent lines, then follows
    pub follow_command: Vec<String>,
    /// Lines kept in a snapshot
    pub recent_lines: usize,
    /// Snapshot reads stop after this even if the command keeps writing
    #[serde(with = "humantime_serde")]
    pub snapshot_timeout: Duration,
}

impl Default for LogsConfig {
    fn default() -> Self {
        let command =
            |args: &[&str]| -> Vec<String> { args.iter().map(|s| s.to_string()).collect() };
        Self {
            recent_command: command(&["journalctl", "-u", "supernode", "-n", "100", "--no-pager"]),
            follow_command: command(&["journalctl", "-u", "supernode", "-n", "100", "-f"]),
            recent_lines: 100,
            snapshot_timeout: Duration::from_secs(5),
        }
    }
}

/// Admin HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allowed CORS origins; empty means same-origin only
    pub cors_origins: Vec<String>,
    /// Take the login client address from `X-Forwarded-For`/`X-Real-IP`.
    /// Only enable behind a reverse proxy that overwrites them.
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            cors_origins: Vec::new(),
            trust_proxy_headers: false,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Duration (de)serialization as `"50ms"`, `"60s"`, `"15m"`, `"24h"`, `"7d"`.
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis();
        if millis % 1000 == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", millis))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Parse a duration string. A bare number is seconds.
    pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            scaled(secs, 1, "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            scaled(mins, 60, "invalid minutes")
        } else if let Some(hours) = s.strip_suffix('h') {
            scaled(hours, 60 * 60, "invalid hours")
        } else if let Some(days) = s.strip_suffix('d') {
            scaled(days, 24 * 60 * 60, "invalid days")
        } else {
            scaled(s, 1, "invalid duration format")
        }
    }

    fn scaled(value: &str, unit_secs: u64, error: &'static str) -> Result<Duration, &'static str> {
        let value = value.trim().parse::<u64>().map_err(|_| error)?;
        value
            .checked_mul(unit_secs)
            .map(Duration::from_secs)
            .ok_or("duration out of range")
    }
}
