//! Journal line matcher for relayed traffic.

use crate::domain::types::HardwareAddr;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FORWARDING: Regex =
        Regex::new(r"forwarding packet.*from ([0-9A-Fa-f:]{17}) to ([0-9A-Fa-f:]{17})")
            .expect("static forwarding pattern");
}

/// Extract `(source, destination)` from a supernode forwarding line.
pub fn parse_forwarding_line(line: &str) -> Option<(HardwareAddr, HardwareAddr)> {
    let caps = FORWARDING.captures(line)?;
    let source = HardwareAddr::canonical(caps.get(1)?.as_str());
    let destination = HardwareAddr::canonical(caps.get(2)?.as_str());
    Some((source, destination))
}
