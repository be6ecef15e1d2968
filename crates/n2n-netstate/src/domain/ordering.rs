//! Ordering of node listings by virtual address.

use std::cmp::Ordering;
use std::net::{IpAddr, Ipv6Addr};

/// Numeric key of a virtual address: the IPv4-mapped 16-byte form.
///
/// A `/prefix` suffix is ignored so `10.0.0.2/24` sorts like `10.0.0.2`.
pub fn address_key(addr: &str) -> Option<[u8; 16]> {
    let host = addr.trim().split('/').next().unwrap_or_default();
    let ip: IpAddr = host.parse().ok()?;
    let v6: Ipv6Addr = match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    };
    Some(v6.octets())
}

/// Parsable addresses ascend numerically; unparsable ones follow,
/// compared lexicographically.
pub fn compare_virtual_addresses(a: &str, b: &str) -> Ordering {
    match (address_key(a), address_key(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
