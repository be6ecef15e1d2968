//! Parser for the management port's `edges` response.
//!
//! The response is plain text, one edge per line, fields separated by `|`.
//! Section headers are free text; the block that starts with a `SUPERNODES`
//! header lists the federation mesh and is skipped until a `SUPERNODE FORWARD`
//! or `FEDERATION` header closes it.

use crate::domain::types::{HardwareAddr, PeerRecord};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Minimum number of `|` separated fields on a peer line.
pub const MIN_PEER_FIELDS: usize = 5;

const SUPERNODES_HEADER: &str = "SUPERNODES";
const SECTION_END_HEADERS: [&str; 2] = ["SUPERNODE FORWARD", "FEDERATION"];

lazy_static! {
    static ref MAC_TOKEN: Regex =
        Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}").expect("static MAC pattern");
}

/// Parse a concatenated `edges` response into peers keyed by canonical
/// hardware address.
///
/// Malformed lines are skipped. A later line for the same address replaces
/// the earlier one.
pub fn parse_edges(response: &str) -> HashMap<HardwareAddr, PeerRecord> {
    let mut peers = HashMap::new();
    let mut in_supernodes = false;

    for line in response.lines() {
        if line.contains(SUPERNODES_HEADER) {
            in_supernodes = true;
            continue;
        }
        if SECTION_END_HEADERS.iter().any(|h| line.contains(h)) {
            in_supernodes = false;
            continue;
        }
        if in_supernodes {
            continue;
        }

        if let Some(peer) = parse_peer_line(line) {
            peers.insert(peer.hardware_addr.clone(), peer);
        }
    }

    peers
}

/// Parse one peer line: field 2 internal, field 4 external, last field
/// last-seen.
pub fn parse_peer_line(line: &str) -> Option<PeerRecord> {
    let mac = MAC_TOKEN.find(line)?;
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < MIN_PEER_FIELDS {
        return None;
    }

    let last = fields.last().map(|f| f.trim()).unwrap_or_default();
    Some(PeerRecord {
        hardware_addr: HardwareAddr::canonical(mac.as_str()),
        internal: fields[1].trim().to_string(),
        external: fields[3].trim().to_string(),
        last_seen: leading_integer(last),
    })
}

/// Leading decimal digits of `s`, or 0.
fn leading_integer(s: &str) -> u64 {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}
