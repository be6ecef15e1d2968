//! Network diagnostic commands the admin panel may run on the host.
//!
//! Only a fixed set of tools is allowed, and the target must be an IP
//! address or a plain host name. The target is passed as a single argument,
//! never through a shell.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Longest host name accepted as a target
pub const MAX_TARGET_LEN: usize = 253;

lazy_static! {
    // dot-separated labels of letters, digits and inner hyphens, 63 chars max each
    static ref HOST_NAME: Regex = Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("static host name pattern");
}

/// Allowed diagnostic tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticTool {
    Ping,
    Traceroute,
}

impl DiagnosticTool {
    /// Exact, case-sensitive match on the tool name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ping" => Some(Self::Ping),
            "traceroute" => Some(Self::Traceroute),
            _ => None,
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Traceroute => "traceroute",
        }
    }

    /// Arguments for a run against `target`: four pings with a 2s reply
    /// wait, or a numeric traceroute of at most 10 hops.
    pub fn args(&self, target: &str) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::Ping => &["-c", "4", "-W", "2"],
            Self::Traceroute => &["-m", "10", "-n"],
        };
        fixed
            .iter()
            .map(|s| s.to_string())
            .chain(std::iter::once(target.to_string()))
            .collect()
    }
}

impl fmt::Display for DiagnosticTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// True for an IP address or a host name of at most 253 characters.
pub fn is_valid_target(target: &str) -> bool {
    if target.is_empty() {
        return false;
    }
    if target.parse::<IpAddr>().is_ok() {
        return true;
    }
    target.len() <= MAX_TARGET_LEN && HOST_NAME.is_match(target)
}

/// Combined stdout and stderr of one run. `error` is set when the tool
/// could not run to a successful exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticOutput {
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiagnosticOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: Some(error.into()),
        }
    }
}
