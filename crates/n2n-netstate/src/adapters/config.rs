//! TOML configuration loading with environment overrides.
//!
//! # Config File Format
//!
//! ```toml
//! [mgmt]
//! addr = "127.0.0.1:56440"
//! read_timeout = "50ms"
//!
//! [geoip]
//! ttl = "24h"
//! max_entries = 1000
//!
//! [login]
//! max_attempts = 5
//! lock_duration = "15m"
//!
//! [auth]
//! username = "admin"
//! password_hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
//!
//! [[nodes]]
//! id = 1
//! name = "laptop"
//! virtual_address = "10.0.0.2"
//! hardware_address = "aa:bb:cc:dd:ee:ff"
//! community = "office"
//! ```
//!
//! # Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `N2N_MGMT_ADDR` | `mgmt.addr` |
//! | `N2N_IP_CACHE_TTL` | `geoip.ttl` (duration) |
//! | `N2N_IP_CACHE_SIZE` | `geoip.max_entries` |
//! | `N2N_GEOIP_ENABLED` | `geoip.enabled` |
//! | `N2N_LOGIN_MAX_ATTEMPTS` | `login.max_attempts` |
//! | `N2N_LOGIN_LOCK_DURATION` | `login.lock_duration` (duration) |
//! | `N2N_ADMIN_USER` | `auth.username` |
//! | `N2N_ADMIN_PASSWORD_HASH` | `auth.password_hash` |
//! | `N2N_HOST` | `server.host` |
//! | `N2N_PORT` | `server.port` |
//! | `N2N_CORS_ORIGINS` | `server.cors_origins` (comma separated) |
//! | `N2N_TRUST_PROXY` | `server.trust_proxy_headers` |
//! | `N2N_ENABLE_NET_TOOLS` | `diagnostics.enabled` |

use crate::domain::config::humantime_serde::parse_duration;
use crate::domain::config::NetStateConfig;
use crate::domain::errors::ConfigError;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// TOML-based configuration provider.
#[derive(Debug, Clone, Default)]
pub struct TomlConfigProvider {
    config: NetStateConfig,
}

impl TomlConfigProvider {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: NetStateConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self { config })
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let c = &mut self.config;

        if let Some(addr) = lookup("N2N_MGMT_ADDR") {
            c.mgmt.addr = addr;
        }
        if let Some(raw) = lookup("N2N_IP_CACHE_TTL") {
            c.geoip.ttl = parse_duration(&raw).map_err(|_| invalid("N2N_IP_CACHE_TTL", &raw))?;
        }
        if let Some(raw) = lookup("N2N_IP_CACHE_SIZE") {
            c.geoip.max_entries = parse_env("N2N_IP_CACHE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("N2N_GEOIP_ENABLED") {
            c.geoip.enabled = parse_bool("N2N_GEOIP_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("N2N_LOGIN_MAX_ATTEMPTS") {
            c.login.max_attempts = parse_env("N2N_LOGIN_MAX_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = lookup("N2N_LOGIN_LOCK_DURATION") {
            c.login.lock_duration =
                parse_duration(&raw).map_err(|_| invalid("N2N_LOGIN_LOCK_DURATION", &raw))?;
        }
        if let Some(user) = lookup("N2N_ADMIN_USER") {
            c.auth.username = user;
        }
        if let Some(hash) = lookup("N2N_ADMIN_PASSWORD_HASH") {
            c.auth.password_hash = Some(hash);
        }
        if let Some(raw) = lookup("N2N_HOST") {
            c.server.host = parse_env("N2N_HOST", &raw)?;
        }
        if let Some(raw) = lookup("N2N_PORT") {
            c.server.port = parse_env("N2N_PORT", &raw)?;
        }
        if let Some(raw) = lookup("N2N_TRUST_PROXY") {
            c.server.trust_proxy_headers = parse_bool("N2N_TRUST_PROXY", &raw)?;
        }
        if let Some(raw) = lookup("N2N_ENABLE_NET_TOOLS") {
            c.diagnostics.enabled = parse_bool("N2N_ENABLE_NET_TOOLS", &raw)?;
        }
        if let Some(raw) = lookup("N2N_CORS_ORIGINS") {
            c.server.cors_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(self)
    }

    /// Validate and return the configuration.
    pub fn into_config(self) -> Result<NetStateConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    pub fn config(&self) -> &NetStateConfig {
        &self.config
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}
