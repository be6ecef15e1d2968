//! Client address for the login throttle.

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Resolve the client address of a request.
///
/// Forwarding headers are only consulted when `trust_proxy_headers` is set;
/// otherwise any client could pick its own throttle key.
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> IpAddr {
    if trust_proxy_headers {
        // Take the first IP (original client)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }
    }

    peer.map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, v.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_peer_address_by_default() {
        let peer: SocketAddr = "203.0.113.9:51000".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "198.51.100.1")]);
        assert_eq!(
            extract_client_ip(&h, Some(peer), false),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let h = headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.1")]);
        assert_eq!(
            extract_client_ip(&h, None, true),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_real_ip_fallback() {
        let h = headers(&[("x-forwarded-for", "garbage"), ("x-real-ip", "2001:db8::7")]);
        assert_eq!(
            extract_client_ip(&h, None, true),
            "2001:db8::7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_localhost_when_unknown() {
        assert_eq!(
            extract_client_ip(&HeaderMap::new(), None, true),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }
}
